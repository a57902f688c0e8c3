use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "output")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub plugin_id: String,
    #[sea_orm(belongs_to, from = "plugin_id", to = "id")]
    pub plugin: HasOne<super::plugin::Entity>,

    pub name: String,
    pub path: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub format: String,

    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
