pub mod auth;
pub mod catalog;
pub mod ingestion;
pub mod plugin;
pub mod ssh_key;
