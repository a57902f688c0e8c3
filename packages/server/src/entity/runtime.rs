use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "runtime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub plugin_id: String,
    #[sea_orm(belongs_to, from = "plugin_id", to = "id")]
    pub plugin: HasOne<super::plugin::Entity>,

    /// Ordered list of environment names; the first is primary.
    #[sea_orm(column_type = "JsonBinary")]
    pub environments: serde_json::Value,
    pub entrypoint: String,
}

impl ActiveModelBehavior for ActiveModel {}
