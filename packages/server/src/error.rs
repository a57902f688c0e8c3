use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ingest::IngestError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::crypto::CryptoError;

/// Longest git or unexpected-failure text echoed back to clients.
const MAX_DETAIL_CHARS: usize = 500;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `DESCRIPTOR_NOT_FOUND`,
    /// `DESCRIPTOR_INVALID`, `REPOSITORY_ERROR`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`,
    /// `USERNAME_TAKEN`, `UNEXPECTED_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "DESCRIPTOR_NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "plugin.yaml not found in the repository.")]
    pub error: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    DescriptorNotFound(String),
    InvalidDescriptor(String),
    /// Clone, probe or tag lookup failed.
    Repository(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    /// Failure outside the known taxonomy; the message is shown to the caller.
    Unexpected(String),
    /// Server-side fault; details are only logged.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DescriptorNotFound(_)
            | AppError::InvalidDescriptor(_)
            | AppError::Repository(_) => StatusCode::BAD_REQUEST,
            AppError::TokenMissing | AppError::TokenInvalid | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::UsernameTaken => StatusCode::CONFLICT,
            AppError::Unexpected(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DescriptorNotFound(_) => "DESCRIPTOR_NOT_FOUND",
            AppError::InvalidDescriptor(_) => "DESCRIPTOR_INVALID",
            AppError::Repository(_) => "REPOSITORY_ERROR",
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenInvalid => "TOKEN_INVALID",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::UsernameTaken => "USERNAME_TAKEN",
            AppError::Unexpected(_) => "UNEXPECTED_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The text placed in the response body and in batch result entries.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::DescriptorNotFound(msg)
            | AppError::InvalidDescriptor(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Repository(msg) | AppError::Unexpected(msg) => truncate(msg),
            AppError::TokenMissing => "Authentication required".into(),
            AppError::TokenInvalid => "Invalid or expired token".into(),
            AppError::InvalidCredentials => "Invalid username or password".into(),
            AppError::PermissionDenied => "Insufficient permissions".into(),
            AppError::UsernameTaken => "Username is already taken".into(),
            AppError::Internal(_) => "An unexpected error occurred".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

fn truncate(msg: &str) -> String {
    if msg.chars().count() <= MAX_DETAIL_CHARS {
        return msg.to_string();
    }
    let mut out: String = msg.chars().take(MAX_DETAIL_CHARS).collect();
    out.push_str("...");
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            AppError::Unexpected(detail) => tracing::error!("Unexpected error: {}", detail),
            _ => {}
        }
        let body = ErrorBody {
            code: self.code(),
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::DescriptorNotFound(_) => AppError::DescriptorNotFound(err.to_string()),
            IngestError::MissingPluginId(_) => AppError::Validation(err.to_string()),
            IngestError::InvalidDescriptor(_) => AppError::InvalidDescriptor(err.to_string()),
            IngestError::Git(_) => {
                tracing::warn!("Repository operation failed: {err}");
                AppError::Repository(err.to_string())
            }
            IngestError::Io(_) => AppError::Unexpected(err.to_string()),
        }
    }
}
