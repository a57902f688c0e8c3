mod common;

mod auth;
mod submit;
mod updates;
