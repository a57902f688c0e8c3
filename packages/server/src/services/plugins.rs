use std::collections::HashMap;

use sea_orm::*;

use crate::entity::plugin::PluginStatus;
use crate::entity::{
    author, category, input, output, plugin, plugin_env_variable, plugin_tag, runtime, tag,
};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::plugin::{PluginListItem, PluginParts, PluginResponse};

pub async fn find_plugin<C: ConnectionTrait>(conn: &C, id: &str) -> Result<plugin::Model, AppError> {
    plugin::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plugin '{id}' not found")))
}

/// Finds a plugin the viewer may see. Unpublished plugins are reported as
/// missing to everyone but their submitter and staff.
pub async fn find_visible_plugin<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    viewer: Option<&AuthUser>,
) -> Result<plugin::Model, AppError> {
    let model = find_plugin(conn, id).await?;
    let visible = model.status == PluginStatus::Approved
        || viewer.is_some_and(|u| u.can_view_unpublished(model.submitted_by));
    if visible {
        Ok(model)
    } else {
        Err(AppError::NotFound(format!("Plugin '{id}' not found")))
    }
}

/// Loads the normalized components of a plugin and assembles its full representation.
pub async fn load_response<C: ConnectionTrait>(
    conn: &C,
    model: plugin::Model,
) -> Result<PluginResponse, DbErr> {
    let author = match model.author_id {
        Some(id) => author::Entity::find_by_id(id).one(conn).await?,
        None => None,
    };
    let category = match model.category_id {
        Some(id) => category::Entity::find_by_id(id).one(conn).await?,
        None => None,
    };
    let runtime = runtime::Entity::find()
        .filter(runtime::Column::PluginId.eq(model.id.as_str()))
        .one(conn)
        .await?;
    let inputs = input::Entity::find()
        .filter(input::Column::PluginId.eq(model.id.as_str()))
        .order_by_asc(input::Column::Position)
        .all(conn)
        .await?;
    let outputs = output::Entity::find()
        .filter(output::Column::PluginId.eq(model.id.as_str()))
        .order_by_asc(output::Column::Position)
        .all(conn)
        .await?;
    let env_variables = plugin_env_variable::Entity::find()
        .filter(plugin_env_variable::Column::PluginId.eq(model.id.as_str()))
        .order_by_asc(plugin_env_variable::Column::Position)
        .all(conn)
        .await?;

    let tag_ids: Vec<i32> = plugin_tag::Entity::find()
        .filter(plugin_tag::Column::PluginId.eq(model.id.as_str()))
        .all(conn)
        .await?
        .into_iter()
        .map(|pt| pt.tag_id)
        .collect();
    let tags = if tag_ids.is_empty() {
        Vec::new()
    } else {
        tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .order_by_asc(tag::Column::Name)
            .all(conn)
            .await?
    };

    Ok(PluginResponse::from(PluginParts {
        plugin: model,
        author,
        category,
        runtime,
        inputs,
        outputs,
        env_variables,
        tags,
    }))
}

/// Catalogue entries for `models`, with author and category names resolved
/// in two queries.
pub async fn list_items<C: ConnectionTrait>(
    conn: &C,
    models: Vec<plugin::Model>,
) -> Result<Vec<PluginListItem>, DbErr> {
    let author_ids: Vec<i32> = models.iter().filter_map(|m| m.author_id).collect();
    let category_ids: Vec<i32> = models.iter().filter_map(|m| m.category_id).collect();

    let authors: HashMap<i32, String> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        author::Entity::find()
            .filter(author::Column::Id.is_in(author_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect()
    };
    let categories: HashMap<i32, String> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|m| PluginListItem {
            author: m.author_id.and_then(|id| authors.get(&id).cloned()),
            category: m.category_id.and_then(|id| categories.get(&id).cloned()),
            id: m.id,
            name: m.name,
            description: m.description,
            version: m.version,
            icon: m.icon,
            status: m.status,
            updated_at: m.updated_at,
        })
        .collect())
}
