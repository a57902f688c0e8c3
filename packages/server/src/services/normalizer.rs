//! Replaces a plugin's child rows with what its descriptor declares.
//!
//! Every sync deletes the previous runtime, inputs, outputs, environment
//! variables and tag links before recreating them, so re-ingesting an
//! unchanged descriptor yields identical rows.

use std::collections::BTreeSet;

use ingest::Descriptor;
use ingest::descriptor::ParameterSpec;
use sea_orm::*;
use tracing::debug;

use crate::entity::{input, output, plugin_env_variable, plugin_tag, runtime};
use crate::services::taxonomy;

/// Row counts written by one sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub runtime: bool,
    pub inputs: usize,
    pub outputs: usize,
    pub env_variables: usize,
    pub tags: usize,
}

pub async fn sync_components<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    descriptor: &Descriptor,
) -> Result<SyncSummary, DbErr> {
    let summary = SyncSummary {
        runtime: sync_runtime(conn, plugin_id, descriptor).await?,
        inputs: sync_inputs(conn, plugin_id, &descriptor.inputs).await?,
        outputs: sync_outputs(conn, plugin_id, descriptor).await?,
        env_variables: sync_env_variables(conn, plugin_id, &descriptor.env_variables).await?,
        tags: sync_tags(conn, plugin_id, &descriptor.plugin.tags).await?,
    };
    debug!(plugin_id, ?summary, "Synced plugin components");
    Ok(summary)
}

async fn sync_runtime<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    descriptor: &Descriptor,
) -> Result<bool, DbErr> {
    runtime::Entity::delete_many()
        .filter(runtime::Column::PluginId.eq(plugin_id))
        .exec(conn)
        .await?;

    let Some(spec) = &descriptor.runtime else {
        return Ok(false);
    };
    runtime::ActiveModel {
        plugin_id: Set(plugin_id.to_string()),
        environments: Set(serde_json::json!(spec.environments)),
        entrypoint: Set(spec.entrypoint.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(true)
}

async fn sync_inputs<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    specs: &[ParameterSpec],
) -> Result<usize, DbErr> {
    input::Entity::delete_many()
        .filter(input::Column::PluginId.eq(plugin_id))
        .exec(conn)
        .await?;

    for (position, spec) in specs.iter().enumerate() {
        input::ActiveModel {
            plugin_id: Set(plugin_id.to_string()),
            name: Set(spec.name.clone()),
            label: Set(spec.label.clone()),
            kind: Set(spec.kind.clone()),
            required: Set(spec.required),
            default_value: Set(spec.default.clone()),
            description: Set(spec.description.clone()),
            placeholder: Set(spec.placeholder.clone()),
            file_types: Set(serde_json::json!(spec.file_types)),
            multiple: Set(spec.multiple),
            source_file: Set(spec.source_file.clone()),
            min_value: Set(spec.min),
            max_value: Set(spec.max),
            step: Set(spec.step),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(specs.len())
}

async fn sync_env_variables<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    specs: &[ParameterSpec],
) -> Result<usize, DbErr> {
    plugin_env_variable::Entity::delete_many()
        .filter(plugin_env_variable::Column::PluginId.eq(plugin_id))
        .exec(conn)
        .await?;

    for (position, spec) in specs.iter().enumerate() {
        plugin_env_variable::ActiveModel {
            plugin_id: Set(plugin_id.to_string()),
            name: Set(spec.name.clone()),
            label: Set(spec.label.clone()),
            kind: Set(spec.kind.clone()),
            required: Set(spec.required),
            default_value: Set(spec.default.clone()),
            description: Set(spec.description.clone()),
            placeholder: Set(spec.placeholder.clone()),
            file_types: Set(serde_json::json!(spec.file_types)),
            multiple: Set(spec.multiple),
            source_file: Set(spec.source_file.clone()),
            min_value: Set(spec.min),
            max_value: Set(spec.max),
            step: Set(spec.step),
            accept: Set(spec.accept.clone()),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(specs.len())
}

async fn sync_outputs<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    descriptor: &Descriptor,
) -> Result<usize, DbErr> {
    output::Entity::delete_many()
        .filter(output::Column::PluginId.eq(plugin_id))
        .exec(conn)
        .await?;

    for (position, spec) in descriptor.outputs.iter().enumerate() {
        output::ActiveModel {
            plugin_id: Set(plugin_id.to_string()),
            name: Set(spec.name.clone()),
            path: Set(spec.path.clone()),
            kind: Set(spec.kind.clone()),
            description: Set(spec.description.clone()),
            format: Set(spec.format.clone()),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(descriptor.outputs.len())
}

async fn sync_tags<C: ConnectionTrait>(
    conn: &C,
    plugin_id: &str,
    names: &[String],
) -> Result<usize, DbErr> {
    plugin_tag::Entity::delete_many()
        .filter(plugin_tag::Column::PluginId.eq(plugin_id))
        .exec(conn)
        .await?;

    let unique: BTreeSet<String> = names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    for name in &unique {
        let tag = taxonomy::get_or_create_tag(conn, name).await?;
        plugin_tag::ActiveModel {
            plugin_id: Set(plugin_id.to_string()),
            tag_id: Set(tag.id),
        }
        .insert(conn)
        .await?;
    }
    Ok(unique.len())
}
