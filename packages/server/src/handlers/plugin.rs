use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::plugin::{self, PluginStatus};
use crate::entity::{author, category, plugin_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, OptionalAuthUser, PLUGIN_MODERATE, PLUGIN_VIEW_ALL};
use crate::extractors::json::AppJson;
use crate::models::ingestion::RecommendedCommitRequest;
use crate::models::plugin::{PluginListItem, PluginListQuery, PluginListResponse, PluginResponse};
use crate::models::shared::{Pagination, escape_like, validate_commit};
use crate::services::plugins::{find_plugin, find_visible_plugin, list_items, load_response};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Plugins",
    operation_id = "listPlugins",
    summary = "Browse the plugin catalogue",
    description = "Paginated list of plugins ordered by most recently updated. Anonymous callers and contributors only see approved plugins; users with `plugin:view_all` may filter by `status`. `q` matches id, name and description case-insensitively.",
    params(PluginListQuery),
    responses(
        (status = 200, description = "Plugin list", body = PluginListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_plugins(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PluginListQuery>,
) -> Result<Json<PluginListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let sees_all = viewer
        .as_ref()
        .is_some_and(|u| u.has_permission(PLUGIN_VIEW_ALL));

    let mut select = plugin::Entity::find();

    match (sees_all, query.status.as_deref()) {
        (true, Some(status)) => {
            let status: PluginStatus = status.parse().map_err(AppError::Validation)?;
            select = select.filter(plugin::Column::Status.eq(status));
        }
        (true, None) => {}
        (false, _) => {
            select = select.filter(plugin::Column::Status.eq(PluginStatus::Approved));
        }
    }

    if let Some(ref q) = query.q {
        let term = escape_like(q.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            let matches = |col: plugin::Column| {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            select = select.filter(
                Condition::any()
                    .add(matches(plugin::Column::Id))
                    .add(matches(plugin::Column::Name))
                    .add(matches(plugin::Column::Description)),
            );
        }
    }

    if let Some(name) = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            plugin::Column::CategoryId.in_subquery(
                SeaQuery::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Name.eq(name))
                    .to_owned(),
            ),
        );
    }

    if let Some(name) = query.author.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            plugin::Column::AuthorId.in_subquery(
                SeaQuery::select()
                    .column(author::Column::Id)
                    .from(author::Entity)
                    .and_where(author::Column::Name.eq(name))
                    .to_owned(),
            ),
        );
    }

    if let Some(name) = query.tag.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            plugin::Column::Id.in_subquery(
                SeaQuery::select()
                    .column((plugin_tag::Entity, plugin_tag::Column::PluginId))
                    .from(plugin_tag::Entity)
                    .inner_join(
                        tag::Entity,
                        Expr::col((tag::Entity, tag::Column::Id))
                            .equals((plugin_tag::Entity, plugin_tag::Column::TagId)),
                    )
                    .and_where(
                        Expr::col((tag::Entity, tag::Column::Name)).eq(name.to_lowercase()),
                    )
                    .to_owned(),
            ),
        );
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let models = select
        .order_by_desc(plugin::Column::UpdatedAt)
        .order_by_asc(plugin::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;
    let data = list_items(&state.db, models).await?;

    Ok(Json(PluginListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = "Plugins",
    operation_id = "listMyPlugins",
    summary = "Plugins submitted by the caller",
    description = "Every plugin the authenticated user submitted, in any status.",
    responses(
        (status = 200, description = "Own plugins", body = Vec<PluginListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_plugins(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PluginListItem>>, AppError> {
    let models = plugin::Entity::find()
        .filter(plugin::Column::SubmittedBy.eq(auth_user.user_id))
        .order_by_desc(plugin::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(list_items(&state.db, models).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Plugins",
    operation_id = "getPlugin",
    summary = "Get a plugin by ID",
    description = "Full plugin record with runtime, parameters, outputs, tags and rendered README. Pending and rejected plugins are only visible to their submitter and staff.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin details", body = PluginResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer), fields(id = %id))]
pub async fn get_plugin(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    let model = find_visible_plugin(&state.db, &id, viewer.as_ref()).await?;
    Ok(Json(load_response(&state.db, model).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "Plugins",
    operation_id = "approvePlugin",
    summary = "Approve a plugin",
    description = "Publishes the plugin in the catalogue. Requires `plugin:moderate` permission.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin approved", body = PluginResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn approve_plugin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    set_status(&state, &auth_user, &id, PluginStatus::Approved).await
}

#[utoipa::path(
    post,
    path = "/{id}/reject",
    tag = "Plugins",
    operation_id = "rejectPlugin",
    summary = "Reject a plugin",
    description = "Hides the plugin from the public catalogue. Requires `plugin:moderate` permission.",
    params(("id" = String, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin rejected", body = PluginResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn reject_plugin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    set_status(&state, &auth_user, &id, PluginStatus::Rejected).await
}

async fn set_status(
    state: &AppState,
    auth_user: &AuthUser,
    id: &str,
    status: PluginStatus,
) -> Result<Json<PluginResponse>, AppError> {
    auth_user.require_permission(PLUGIN_MODERATE)?;

    let model = find_plugin(&state.db, id).await?;
    let mut active: plugin::ActiveModel = model.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    info!(plugin_id = %model.id, status = status.as_str(), moderator = auth_user.user_id, "Plugin moderated");
    Ok(Json(load_response(&state.db, model).await?))
}

#[utoipa::path(
    put,
    path = "/{id}/recommended-commit",
    tag = "Plugins",
    operation_id = "setRecommendedCommit",
    summary = "Pin or clear the recommended commit",
    description = "Sets the commit users should run instead of upstream HEAD. `null` clears the pin. Allowed for the submitter and staff.",
    params(("id" = String, Path, description = "Plugin ID")),
    request_body = RecommendedCommitRequest,
    responses(
        (status = 200, description = "Recommendation updated", body = PluginResponse),
        (status = 400, description = "Not a commit hash (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn set_recommended_commit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RecommendedCommitRequest>,
) -> Result<Json<PluginResponse>, AppError> {
    let model = find_plugin(&state.db, &id).await?;
    auth_user.require_owner_or_staff(model.submitted_by)?;

    let commit = payload
        .commit
        .as_deref()
        .map(validate_commit)
        .transpose()?;

    let mut active: plugin::ActiveModel = model.into();
    active.recommended_commit = Set(commit);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(load_response(&state.db, model).await?))
}
