use serde::Serialize;

use crate::error::AppError;

/// Longest repository URL accepted anywhere in the API.
const MAX_URL_LEN: usize = 500;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a repository URL and return it trimmed.
///
/// Accepts `https://`, `http://`, `ssh://` and scp-style `user@host:path`
/// remotes. `file://` URLs and absolute paths only when `allow_local` is set.
pub fn validate_repository_url(url: &str, allow_local: bool) -> Result<String, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Repository URL must not be empty".into()));
    }
    if url.chars().count() > MAX_URL_LEN {
        return Err(AppError::Validation(format!(
            "Repository URL must be at most {MAX_URL_LEN} characters"
        )));
    }
    if url.chars().any(char::is_whitespace) || url.starts_with('-') {
        return Err(AppError::Validation(
            "Repository URL must not contain whitespace or start with '-'".into(),
        ));
    }

    let remote = ["https://", "http://", "ssh://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| rest.contains('/')))
        || ingest::git::is_ssh_url(url);
    let local = url.starts_with("file://") || url.starts_with('/');

    if remote || (allow_local && local) {
        Ok(url.to_string())
    } else {
        Err(AppError::Validation(format!(
            "Unsupported repository URL '{url}': expected https://, ssh:// or git@host:path"
        )))
    }
}

/// Validate a commit reference: an abbreviated or full SHA-1 or SHA-256
/// object name, 7-64 hexadecimal characters.
pub fn validate_commit(commit: &str) -> Result<String, AppError> {
    let commit = commit.trim();
    if (7..=64).contains(&commit.len()) && commit.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(commit.to_ascii_lowercase())
    } else {
        Err(AppError::Validation(
            "Commit must be 7-64 hexadecimal characters".into(),
        ))
    }
}
