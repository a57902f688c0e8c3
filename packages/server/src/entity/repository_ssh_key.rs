use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user deploy key for one repository. Key material is stored encrypted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repository_ssh_key")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "user_repository")]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(unique_key = "user_repository")]
    pub repository_url: String,
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub private_key: String,
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text", nullable)]
    pub passphrase: Option<String>,
    pub fingerprint: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
