use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Environment variable a plugin reads at execution time.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin_env_variable")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub plugin_id: String,
    #[sea_orm(belongs_to, from = "plugin_id", to = "id")]
    pub plugin: HasOne<super::plugin::Entity>,

    pub name: String,
    pub label: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub required: bool,
    #[sea_orm(column_name = "default", column_type = "Text", nullable)]
    pub default_value: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub placeholder: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub file_types: serde_json::Value,
    pub multiple: bool,
    pub source_file: String,
    #[sea_orm(column_name = "min")]
    pub min_value: Option<f64>,
    #[sea_orm(column_name = "max")]
    pub max_value: Option<f64>,
    pub step: Option<f64>,
    pub accept: String,

    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
