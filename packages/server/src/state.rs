use std::sync::Arc;

use ingest::{DiagramSynthesizer, GitClient, NoDiagram, ProgressLogDiagram};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::crypto::{AesGcmSecretProvider, CryptoError, SecretProvider};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub git: GitClient,
    pub secrets: Arc<dyn SecretProvider>,
    pub diagrams: Arc<dyn DiagramSynthesizer>,
}

impl AppState {
    /// Wires the git client, secret provider and diagram synthesizer from configuration.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self, CryptoError> {
        let secrets = AesGcmSecretProvider::from_base64_key(&config.secrets.encryption_key)?;
        let diagrams: Arc<dyn DiagramSynthesizer> = if config.registry.diagrams_enabled {
            Arc::new(ProgressLogDiagram)
        } else {
            Arc::new(NoDiagram)
        };
        let git = GitClient::new(
            config.registry.git_bin.clone(),
            config.registry.clone_timeout(),
        );
        Ok(Self {
            db,
            config,
            git,
            secrets: Arc::new(secrets),
            diagrams,
        })
    }
}
