use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{input, output, plugin, plugin_env_variable, role, role_permission};
use crate::extractors::auth::{
    PLUGIN_BATCH_SUBMIT, PLUGIN_MANAGE, PLUGIN_MODERATE, PLUGIN_SUBMIT, PLUGIN_VIEW_ALL,
    SSH_KEY_MANAGE,
};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[role::ADMIN_ROLE, role::DEFAULT_ROLE];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    (role::ADMIN_ROLE, PLUGIN_SUBMIT),
    (role::ADMIN_ROLE, PLUGIN_BATCH_SUBMIT),
    (role::ADMIN_ROLE, PLUGIN_MODERATE),
    (role::ADMIN_ROLE, PLUGIN_MANAGE),
    (role::ADMIN_ROLE, PLUGIN_VIEW_ALL),
    (role::ADMIN_ROLE, SSH_KEY_MANAGE),
    (role::DEFAULT_ROLE, PLUGIN_SUBMIT),
    (role::DEFAULT_ROLE, SSH_KEY_MANAGE),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure composite indexes exist. Schema sync only creates single-column ones.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Ordered child lookups in the plugin detail view.
    let indexes = [
        (
            "idx_input_plugin_position",
            Index::create()
                .table(input::Entity)
                .col(input::Column::PluginId)
                .col(input::Column::Position)
                .to_owned(),
        ),
        (
            "idx_output_plugin_position",
            Index::create()
                .table(output::Entity)
                .col(output::Column::PluginId)
                .col(output::Column::Position)
                .to_owned(),
        ),
        (
            "idx_env_variable_plugin_position",
            Index::create()
                .table(plugin_env_variable::Entity)
                .col(plugin_env_variable::Column::PluginId)
                .col(plugin_env_variable::Column::Position)
                .to_owned(),
        ),
        // Catalogue listing: WHERE status = ? ORDER BY updated_at DESC
        (
            "idx_plugin_status_updated",
            Index::create()
                .table(plugin::Entity)
                .col(plugin::Column::Status)
                .col(plugin::Column::UpdatedAt)
                .to_owned(),
        ),
    ];

    for (name, mut index) in indexes {
        let stmt = index
            .if_not_exists()
            .name(name)
            .to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }
    Ok(())
}
