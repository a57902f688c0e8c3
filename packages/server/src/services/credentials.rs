use ingest::git::url_spellings;
use ingest::{SshCredential, TransportKey};
use sea_orm::*;
use tracing::{debug, warn};

use crate::crypto::SecretProvider;
use crate::entity::repository_ssh_key;
use crate::extractors::auth::AuthUser;

/// Looks up and decrypts the key `user_id` stored for `repository_url`,
/// trying both SSH spellings of the URL.
///
/// Any lookup or decryption failure is reported as "no credential".
pub async fn find_ssh_credential<C: ConnectionTrait>(
    conn: &C,
    secrets: &dyn SecretProvider,
    user_id: i32,
    repository_url: &str,
) -> Option<SshCredential> {
    let spellings = url_spellings(repository_url);
    let rows = match repository_ssh_key::Entity::find()
        .filter(repository_ssh_key::Column::UserId.eq(user_id))
        .filter(repository_ssh_key::Column::RepositoryUrl.is_in(spellings.clone()))
        .all(conn)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(user_id, error = %e, "SSH key lookup failed");
            return None;
        }
    };

    // Prefer the exact spelling the caller used.
    let row = spellings
        .iter()
        .find_map(|url| rows.iter().find(|r| &r.repository_url == url))?;

    let private_key = match secrets.decrypt(&row.private_key) {
        Ok(key) => key,
        Err(e) => {
            warn!(user_id, key_id = row.id, error = %e, "Stored SSH key could not be decrypted");
            return None;
        }
    };
    let passphrase = match row.passphrase.as_deref().map(|p| secrets.decrypt(p)) {
        None => None,
        Some(Ok(p)) => Some(p),
        Some(Err(e)) => {
            warn!(user_id, key_id = row.id, error = %e, "Stored passphrase could not be decrypted");
            return None;
        }
    };

    debug!(user_id, key_id = row.id, "Resolved SSH credential");
    Some(SshCredential {
        private_key,
        passphrase,
    })
}

/// Materializes the first credential found among `candidates` (in order) as a
/// temporary key file. `None` means anonymous transport.
pub async fn resolve_transport<C: ConnectionTrait>(
    conn: &C,
    secrets: &dyn SecretProvider,
    candidates: &[i32],
    repository_url: &str,
) -> Option<TransportKey> {
    for &user_id in candidates {
        let Some(credential) = find_ssh_credential(conn, secrets, user_id, repository_url).await
        else {
            continue;
        };
        match TransportKey::materialize(&credential) {
            Ok(key) => return Some(key),
            Err(e) => {
                warn!(user_id, error = %e, "Failed to write SSH key to disk");
                return None;
            }
        }
    }
    None
}

/// Whose keys to try for a repository: the acting user first, then the
/// plugin's original submitter. The submitter's key is only lent to the
/// submitter themself and to staff.
pub fn key_candidates(actor: &AuthUser, submitted_by: Option<i32>) -> Vec<i32> {
    let mut candidates = vec![actor.user_id];
    if actor.require_owner_or_staff(submitted_by).is_err() {
        return candidates;
    }
    if let Some(owner) = submitted_by.filter(|&owner| owner != actor.user_id) {
        candidates.push(owner);
    }
    candidates
}
