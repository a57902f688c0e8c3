use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "author")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub email: Option<String>,

    #[sea_orm(has_many)]
    pub plugins: HasMany<super::plugin::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
