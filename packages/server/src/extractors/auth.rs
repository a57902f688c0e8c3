use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Submit a single repository.
pub const PLUGIN_SUBMIT: &str = "plugin:submit";
/// Submit several repositories in one request.
pub const PLUGIN_BATCH_SUBMIT: &str = "plugin:batch_submit";
/// Approve or reject submissions.
pub const PLUGIN_MODERATE: &str = "plugin:moderate";
/// Refresh, sync and pin any plugin regardless of submitter.
pub const PLUGIN_MANAGE: &str = "plugin:manage";
/// See pending and rejected plugins of every submitter.
pub const PLUGIN_VIEW_ALL: &str = "plugin:view_all";
pub const SSH_KEY_MANAGE: &str = "ssh_key:manage";

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Permission checks happen via `require_permission()` in the handler body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Staff may act on plugins they did not submit.
    pub fn is_staff(&self) -> bool {
        self.has_permission(PLUGIN_MANAGE)
    }

    /// Owner-or-staff rule for mutating a plugin.
    pub fn require_owner_or_staff(&self, submitted_by: Option<i32>) -> Result<(), AppError> {
        if self.is_staff() || submitted_by == Some(self.user_id) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Whether a plugin in a non-public state is visible to this user.
    pub fn can_view_unpublished(&self, submitted_by: Option<i32>) -> bool {
        self.has_permission(PLUGIN_VIEW_ALL) || submitted_by == Some(self.user_id)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| AppError::TokenInvalid)?;
    header
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or(AppError::TokenInvalid)
}

fn decode_user(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;
    Ok(AuthUser {
        user_id: claims.uid,
        username: claims.sub,
        role: claims.role,
        permissions: claims.permissions,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::TokenMissing)?;
        decode_user(token, state)
    }
}

/// Like [`AuthUser`] but lets anonymous requests through. A token that is
/// present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => decode_user(token, state).map(|user| Self(Some(user))),
            None => Ok(Self(None)),
        }
    }
}
