use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::repository_ssh_key;
use crate::error::AppError;

const MAX_KEY_BYTES: usize = 16 * 1024;

/// Register a deploy key for one repository.
#[derive(Deserialize, ToSchema)]
pub struct CreateSshKeyRequest {
    #[schema(example = "git@github.com:lab/private-tool.git")]
    pub repository_url: String,
    /// PEM/OpenSSH private key text.
    pub private_key: String,
    pub passphrase: Option<String>,
}

pub fn validate_create_ssh_key(payload: &CreateSshKeyRequest) -> Result<(), AppError> {
    let key = payload.private_key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("Private key must not be empty".into()));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(AppError::Validation(format!(
            "Private key must be at most {MAX_KEY_BYTES} bytes"
        )));
    }
    if !key.contains("PRIVATE KEY-----") {
        return Err(AppError::Validation(
            "Private key must be in PEM or OpenSSH format".into(),
        ));
    }
    Ok(())
}

/// Stored key metadata. Key material is never returned.
#[derive(Serialize, ToSchema)]
pub struct SshKeyResponse {
    pub id: i32,
    pub repository_url: String,
    #[schema(example = "SHA256:9f86d081884c7d65")]
    pub fingerprint: String,
    pub has_passphrase: bool,
    pub created_at: DateTime<Utc>,
}

impl From<repository_ssh_key::Model> for SshKeyResponse {
    fn from(m: repository_ssh_key::Model) -> Self {
        Self {
            id: m.id,
            repository_url: m.repository_url,
            fingerprint: m.fingerprint,
            has_passphrase: m.passphrase.is_some(),
            created_at: m.created_at,
        }
    }
}
