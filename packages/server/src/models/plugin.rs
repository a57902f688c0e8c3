use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::plugin::PluginStatus;
use crate::entity::{author, category, input, output, plugin, plugin_env_variable, runtime, tag};
use crate::models::shared::Pagination;

/// Full plugin representation including its normalized components.
#[derive(Serialize, ToSchema)]
pub struct PluginResponse {
    #[schema(example = "fold-change")]
    pub id: String,
    #[schema(example = "Fold Change")]
    pub name: String,
    pub description: String,
    #[schema(example = "1.2.0")]
    pub version: String,
    pub author: Option<AuthorResponse>,
    pub category: Option<CategoryResponse>,
    pub subcategory: Option<String>,
    pub icon: Option<String>,
    #[schema(example = "https://github.com/lab/fold-change")]
    pub repository: Option<String>,
    pub commit_hash: Option<String>,
    pub recommended_commit: Option<String>,
    pub latest_stable_tag: Option<String>,
    /// Rendered README HTML.
    pub readme: Option<String>,
    pub diagram_enabled: bool,
    pub citation_enabled: bool,
    pub requires_auth: bool,
    pub status: PluginStatus,
    pub submitted_by: Option<i32>,
    pub tags: Vec<String>,
    pub runtime: Option<RuntimeResponse>,
    pub inputs: Vec<ParameterResponse>,
    pub outputs: Vec<OutputResponse>,
    pub env_variables: Vec<ParameterResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to assemble a [`PluginResponse`].
pub struct PluginParts {
    pub plugin: plugin::Model,
    pub author: Option<author::Model>,
    pub category: Option<category::Model>,
    pub runtime: Option<runtime::Model>,
    pub inputs: Vec<input::Model>,
    pub outputs: Vec<output::Model>,
    pub env_variables: Vec<plugin_env_variable::Model>,
    pub tags: Vec<tag::Model>,
}

impl From<PluginParts> for PluginResponse {
    fn from(parts: PluginParts) -> Self {
        let p = parts.plugin;
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            version: p.version,
            author: parts.author.map(AuthorResponse::from),
            category: parts.category.map(CategoryResponse::from),
            subcategory: p.subcategory,
            icon: p.icon,
            repository: p.repository,
            commit_hash: p.commit_hash,
            recommended_commit: p.recommended_commit,
            latest_stable_tag: p.latest_stable_tag,
            readme: p.readme,
            diagram_enabled: p.diagram_enabled,
            citation_enabled: p.citation_enabled,
            requires_auth: p.requires_auth,
            status: p.status,
            submitted_by: p.submitted_by,
            tags: parts.tags.into_iter().map(|t| t.name).collect(),
            runtime: parts.runtime.map(RuntimeResponse::from),
            inputs: parts.inputs.into_iter().map(ParameterResponse::from).collect(),
            outputs: parts.outputs.into_iter().map(OutputResponse::from).collect(),
            env_variables: parts
                .env_variables
                .into_iter()
                .map(ParameterResponse::from)
                .collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RuntimeResponse {
    /// Ordered execution environments; the first is primary.
    #[schema(example = json!(["python", "r"]))]
    pub environments: Vec<String>,
    #[schema(example = "scripts/run.py")]
    pub entrypoint: String,
}

impl From<runtime::Model> for RuntimeResponse {
    fn from(m: runtime::Model) -> Self {
        Self {
            environments: json_strings(m.environments),
            entrypoint: m.entrypoint,
        }
    }
}

/// A declared input or environment variable.
#[derive(Serialize, ToSchema)]
pub struct ParameterResponse {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    #[schema(example = "number")]
    pub kind: String,
    pub required: bool,
    /// Default value as text.
    pub default: Option<String>,
    pub description: String,
    pub placeholder: String,
    pub file_types: Vec<String>,
    pub multiple: bool,
    pub source_file: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    /// Only present on environment variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
}

impl From<input::Model> for ParameterResponse {
    fn from(m: input::Model) -> Self {
        Self {
            name: m.name,
            label: m.label,
            kind: m.kind,
            required: m.required,
            default: m.default_value,
            description: m.description,
            placeholder: m.placeholder,
            file_types: json_strings(m.file_types),
            multiple: m.multiple,
            source_file: m.source_file,
            min: m.min_value,
            max: m.max_value,
            step: m.step,
            accept: None,
        }
    }
}

impl From<plugin_env_variable::Model> for ParameterResponse {
    fn from(m: plugin_env_variable::Model) -> Self {
        Self {
            name: m.name,
            label: m.label,
            kind: m.kind,
            required: m.required,
            default: m.default_value,
            description: m.description,
            placeholder: m.placeholder,
            file_types: json_strings(m.file_types),
            multiple: m.multiple,
            source_file: m.source_file,
            min: m.min_value,
            max: m.max_value,
            step: m.step,
            accept: Some(m.accept),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct OutputResponse {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub format: String,
}

impl From<output::Model> for OutputResponse {
    fn from(m: output::Model) -> Self {
        Self {
            name: m.name,
            path: m.path,
            kind: m.kind,
            description: m.description,
            format: m.format,
        }
    }
}

fn json_strings(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

#[derive(Serialize, ToSchema)]
pub struct AuthorResponse {
    pub id: i32,
    #[schema(example = "Lab Team")]
    pub name: String,
    pub email: Option<String>,
}

impl From<author::Model> for AuthorResponse {
    fn from(m: author::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    #[schema(example = "analysis")]
    pub name: String,
    pub description: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    #[schema(example = "proteomics")]
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

/// Query parameters for the plugin catalogue.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PluginListQuery {
    /// Case-insensitive search over id, name and description.
    pub q: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Author name.
    pub author: Option<String>,
    /// Tag name.
    pub tag: Option<String>,
    /// `pending`, `approved` or `rejected`. Non-staff callers only see approved plugins.
    pub status: Option<String>,
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 20, max 100).
    pub per_page: Option<u64>,
}

/// Catalogue entry without README or components.
#[derive(Serialize, ToSchema)]
pub struct PluginListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub status: PluginStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct PluginListResponse {
    pub data: Vec<PluginListItem>,
    pub pagination: Pagination,
}
