use thiserror::Error;

/// Substrings of git's stderr that indicate the remote refused anonymous or keyed access.
const AUTH_FAILURE_MARKERS: &[&str] = &["authentication", "permission denied", "could not read"];

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {operation} failed: {stderr}")]
    CommandFailed {
        operation: &'static str,
        stderr: String,
    },

    #[error("failed to launch git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("unexpected git output: {0}")]
    InvalidOutput(String),
}

impl GitError {
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => is_auth_failure_message(stderr),
            _ => false,
        }
    }
}

pub fn is_auth_failure_message(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    AUTH_FAILURE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} not found in the repository.")]
    DescriptorNotFound(String),

    #[error("Plugin ID not found in {0}.")]
    MissingPluginId(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Failed to clone repository: {0}")]
    Git(#[from] GitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
