use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, PLUGIN_BATCH_SUBMIT, PLUGIN_SUBMIT};
use crate::extractors::json::AppJson;
use crate::models::ingestion::{
    BatchSubmitRequest, BatchSubmitResponse, SubmitPluginRequest, UpdateCheckResponse,
};
use crate::models::plugin::PluginResponse;
use crate::models::shared::validate_repository_url;
use crate::services::ingestion::{IngestMode, IngestRequest, ingest_batch, ingest_repository};
use crate::services::plugins::{find_plugin, find_visible_plugin};
use crate::services::updates::{check_for_update, repository_of};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/submit",
    tag = "Ingestion",
    operation_id = "submitPlugin",
    summary = "Submit a plugin repository",
    description = "Clones the repository, reads its descriptor and README and upserts the plugin. Private repositories are cloned with the caller's stored SSH key for that URL. Resubmitting a repository updates the existing plugin; only its submitter and staff may do so. Requires `plugin:submit` permission.",
    request_body = SubmitPluginRequest,
    responses(
        (status = 201, description = "Plugin created", body = PluginResponse),
        (status = 200, description = "Existing plugin updated", body = PluginResponse),
        (status = 400, description = "Bad URL or descriptor (VALIDATION_ERROR, DESCRIPTOR_NOT_FOUND, DESCRIPTOR_INVALID, REPOSITORY_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn submit_plugin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitPluginRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PLUGIN_SUBMIT)?;
    let repo_url = validate_repository_url(
        &payload.repo_url,
        state.config.registry.allow_local_repositories,
    )?;

    let outcome = ingest_repository(
        &state,
        IngestRequest {
            repo_url: &repo_url,
            actor: &auth_user,
            mode: IngestMode::Submit,
            probe: true,
            existing: None,
        },
    )
    .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.plugin)))
}

#[utoipa::path(
    post,
    path = "/batch",
    tag = "Ingestion",
    operation_id = "batchSubmitPlugins",
    summary = "Submit several repositories",
    description = "Ingests each URL in order. A failing URL is reported in `results` and does not stop the others. Requires `plugin:batch_submit` permission.",
    request_body = BatchSubmitRequest,
    responses(
        (status = 200, description = "Per-URL outcomes", body = BatchSubmitResponse),
        (status = 400, description = "Empty or oversized batch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, count = payload.repo_urls.len()))]
pub async fn batch_submit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BatchSubmitRequest>,
) -> Result<Json<BatchSubmitResponse>, AppError> {
    auth_user.require_permission(PLUGIN_BATCH_SUBMIT)?;

    let limit = state.config.registry.batch_limit;
    if payload.repo_urls.is_empty() {
        return Err(AppError::Validation(
            "repo_urls must contain at least one URL".into(),
        ));
    }
    if payload.repo_urls.len() > limit {
        return Err(AppError::Validation(format!(
            "At most {limit} repositories may be submitted at once"
        )));
    }

    Ok(Json(ingest_batch(&state, &auth_user, &payload.repo_urls).await))
}

#[utoipa::path(
    post,
    path = "/{id}/refresh",
    tag = "Ingestion",
    operation_id = "refreshPlugin",
    summary = "Re-ingest a plugin from its repository",
    description = "Clones the stored repository again and replaces metadata, components and README. Status and submitter are kept. Allowed for the submitter and staff.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin refreshed", body = PluginResponse),
        (status = 400, description = "No repository or bad descriptor (VALIDATION_ERROR, DESCRIPTOR_NOT_FOUND, DESCRIPTOR_INVALID, REPOSITORY_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn refresh_plugin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    reingest(&state, &auth_user, &id, IngestMode::Refresh).await
}

#[utoipa::path(
    post,
    path = "/{id}/sync",
    tag = "Ingestion",
    operation_id = "syncPlugin",
    summary = "Sync a plugin to upstream HEAD",
    description = "Like refresh, and additionally records the newest tag of the repository as `latest_stable_tag`. Allowed for the submitter and staff.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin synced", body = PluginResponse),
        (status = 400, description = "No repository or bad descriptor (VALIDATION_ERROR, DESCRIPTOR_NOT_FOUND, DESCRIPTOR_INVALID, REPOSITORY_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn sync_plugin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    reingest(&state, &auth_user, &id, IngestMode::SyncLatest).await
}

async fn reingest(
    state: &AppState,
    auth_user: &AuthUser,
    id: &str,
    mode: IngestMode,
) -> Result<Json<PluginResponse>, AppError> {
    let existing = find_plugin(&state.db, id).await?;
    auth_user.require_owner_or_staff(existing.submitted_by)?;
    let repo_url = repository_of(&existing)?.to_string();

    let outcome = ingest_repository(
        state,
        IngestRequest {
            repo_url: &repo_url,
            actor: auth_user,
            mode,
            probe: true,
            existing: Some(&existing),
        },
    )
    .await?;
    Ok(Json(outcome.plugin))
}

#[utoipa::path(
    get,
    path = "/{id}/check-update",
    tag = "Ingestion",
    operation_id = "checkPluginUpdate",
    summary = "Compare a plugin with its upstream repository",
    description = "Reads upstream HEAD and the newest tag without modifying the plugin. The target is the recommended commit when one is pinned, upstream HEAD otherwise.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Update status", body = UpdateCheckResponse),
        (status = 400, description = "No repository or clone failed (VALIDATION_ERROR, REPOSITORY_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn check_update(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateCheckResponse>, AppError> {
    let plugin = find_visible_plugin(&state.db, &id, Some(&auth_user)).await?;
    Ok(Json(check_for_update(&state, &auth_user, &plugin).await?))
}
