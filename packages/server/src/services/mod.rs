pub mod accounts;
pub mod credentials;
pub mod ingestion;
pub mod normalizer;
pub mod plugins;
pub mod taxonomy;
pub mod updates;
