use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

/// Moderation state of a plugin.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    /// Awaiting moderation; hidden from the public catalogue.
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl PluginStatus {
    pub const ALL: &'static [PluginStatus] = &[Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Status given to a plugin entering the registry through a submission.
    pub fn initial(auto_approve: bool) -> Self {
        if auto_approve {
            Self::Approved
        } else {
            Self::Pending
        }
    }
}

impl std::str::FromStr for PluginStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!("status must be one of: pending, approved, rejected (got '{s}')")
            })
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin")]
pub struct Model {
    /// Identifier declared in the descriptor.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub version: String,

    pub author_id: Option<i32>,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::author::Entity>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub subcategory: Option<String>,
    pub icon: Option<String>,

    /// Remote the plugin was ingested from; NULL for locally imported plugins.
    pub repository: Option<String>,
    /// Commit the stored metadata was read from.
    pub commit_hash: Option<String>,
    /// Commit maintainers pin as the upgrade target.
    pub recommended_commit: Option<String>,
    pub latest_stable_tag: Option<String>,

    /// Rendered README HTML.
    #[sea_orm(column_type = "Text", nullable)]
    pub readme: Option<String>,

    pub diagram_enabled: bool,
    pub citation_enabled: bool,
    pub requires_auth: bool,

    #[sea_orm(indexed)]
    pub status: PluginStatus,

    /// Set once, when the plugin is first created.
    pub submitted_by: Option<i32>,
    #[sea_orm(belongs_to, from = "submitted_by", to = "id")]
    pub submitter: HasOne<super::user::Entity>,

    #[sea_orm(has_one)]
    pub runtime: HasOne<super::runtime::Entity>,

    #[sea_orm(has_many)]
    pub inputs: HasMany<super::input::Entity>,

    #[sea_orm(has_many)]
    pub outputs: HasMany<super::output::Entity>,

    #[sea_orm(has_many)]
    pub env_variables: HasMany<super::plugin_env_variable::Entity>,

    #[sea_orm(has_many, via = "plugin_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
