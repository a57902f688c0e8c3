use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Ingestion behaviour.
#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Newly submitted plugins start as `approved` instead of `pending`.
    #[serde(default)]
    pub auto_approve: bool,
    /// Maximum number of URLs accepted by one batch submission.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    #[serde(default = "default_true")]
    pub diagrams_enabled: bool,
    /// Accept `file://` and absolute-path repositories. Off outside tests.
    #[serde(default)]
    pub allow_local_repositories: bool,
    #[serde(default = "default_git_bin")]
    pub git_bin: String,
    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,
    #[serde(default = "default_readme_file")]
    pub readme_file: String,
}

fn default_batch_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_git_bin() -> String {
    "git".into()
}

fn default_clone_timeout_secs() -> u64 {
    300
}

fn default_descriptor_file() -> String {
    ingest::descriptor::DEFAULT_DESCRIPTOR_FILE.into()
}

fn default_readme_file() -> String {
    ingest::readme::DEFAULT_README_FILE.into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            batch_limit: default_batch_limit(),
            diagrams_enabled: true,
            allow_local_repositories: false,
            git_bin: default_git_bin(),
            clone_timeout_secs: default_clone_timeout_secs(),
            descriptor_file: default_descriptor_file(),
            readme_file: default_readme_file(),
        }
    }
}

impl RegistryConfig {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretsConfig {
    /// Base64 of a 32-byte key. Generate one with `registry generate-key`.
    pub encryption_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub secrets: SecretsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., REGISTRY__SECRETS__ENCRYPTION_KEY)
            .add_source(
                Environment::with_prefix("REGISTRY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
