use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{info, instrument};

use crate::crypto::fingerprint;
use crate::entity::repository_ssh_key;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, SSH_KEY_MANAGE};
use crate::extractors::json::AppJson;
use crate::models::shared::validate_repository_url;
use crate::models::ssh_key::{CreateSshKeyRequest, SshKeyResponse, validate_create_ssh_key};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "SSH Keys",
    operation_id = "listSshKeys",
    summary = "List the caller's SSH keys",
    description = "Returns metadata of every repository key the caller stored. Key material is never returned. Requires `ssh_key:manage` permission.",
    responses(
        (status = 200, description = "Stored keys", body = Vec<SshKeyResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_ssh_keys(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SshKeyResponse>>, AppError> {
    auth_user.require_permission(SSH_KEY_MANAGE)?;

    let rows = repository_ssh_key::Entity::find()
        .filter(repository_ssh_key::Column::UserId.eq(auth_user.user_id))
        .order_by_asc(repository_ssh_key::Column::RepositoryUrl)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "SSH Keys",
    operation_id = "createSshKey",
    summary = "Store an SSH key for a repository",
    description = "Encrypts and stores a private key (and optional passphrase) used to clone one repository on the caller's behalf. One key per user and repository URL. Requires `ssh_key:manage` permission.",
    request_body = CreateSshKeyRequest,
    responses(
        (status = 201, description = "Key stored", body = SshKeyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "A key for this repository already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_ssh_key(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSshKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SSH_KEY_MANAGE)?;
    validate_create_ssh_key(&payload)?;
    let repository_url = validate_repository_url(
        &payload.repository_url,
        state.config.registry.allow_local_repositories,
    )?;

    let private_key = payload.private_key.trim();
    let passphrase = payload
        .passphrase
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| state.secrets.encrypt(p))
        .transpose()?;

    let model = repository_ssh_key::ActiveModel {
        user_id: Set(auth_user.user_id),
        repository_url: Set(repository_url),
        private_key: Set(state.secrets.encrypt(private_key)?),
        passphrase: Set(passphrase),
        fingerprint: Set(fingerprint(private_key)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("An SSH key for this repository already exists".into())
        }
        _ => AppError::from(e),
    })?;

    info!(key_id = model.id, repository_url = %model.repository_url, "Stored SSH key");
    Ok((StatusCode::CREATED, Json(SshKeyResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "SSH Keys",
    operation_id = "deleteSshKey",
    summary = "Delete one of the caller's SSH keys",
    params(("id" = i32, Path, description = "Key ID")),
    responses(
        (status = 204, description = "Key deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Key not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_ssh_key(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission(SSH_KEY_MANAGE)?;

    let result = repository_ssh_key::Entity::delete_many()
        .filter(repository_ssh_key::Column::Id.eq(id))
        .filter(repository_ssh_key::Column::UserId.eq(auth_user.user_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("SSH key {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
