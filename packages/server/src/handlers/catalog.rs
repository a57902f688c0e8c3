//! Taxonomy listings used to build catalogue filters.

use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{author, category, tag};
use crate::error::{AppError, ErrorBody};
use crate::models::plugin::{AuthorResponse, CategoryResponse, TagResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Catalogue",
    operation_id = "listAuthors",
    summary = "List plugin authors",
    responses(
        (status = 200, description = "Authors ordered by name", body = Vec<AuthorResponse>),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuthorResponse>>, AppError> {
    let rows = author::Entity::find()
        .order_by_asc(author::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Catalogue",
    operation_id = "listCategories",
    summary = "List plugin categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<CategoryResponse>),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Catalogue",
    operation_id = "listTags",
    summary = "List tags",
    responses(
        (status = 200, description = "Tags ordered by name", body = Vec<TagResponse>),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let rows = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
