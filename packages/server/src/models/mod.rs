pub mod auth;
pub mod ingestion;
pub mod plugin;
pub mod shared;
pub mod ssh_key;
