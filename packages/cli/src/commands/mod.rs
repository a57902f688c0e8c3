pub mod create_admin;
pub mod generate_key;
pub mod import;

use anyhow::Context;
use registry_server::config::AppConfig;
use registry_server::{database, seed};
use sea_orm::DatabaseConnection;

/// Loads configuration and connects with the schema synced and roles seeded.
pub(crate) async fn connect() -> anyhow::Result<(AppConfig, DatabaseConnection)> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::seed_role_permissions(&db).await?;
    Ok((config, db))
}
