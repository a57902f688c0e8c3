use anyhow::anyhow;
use console::style;
use registry_server::entity::{role, user};
use registry_server::models::auth::{RegisterRequest, validate_register_request};
use registry_server::services::accounts;
use sea_orm::*;

pub async fn run(username: &str, password: &str) -> anyhow::Result<()> {
    let request = RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    validate_register_request(&request).map_err(|e| anyhow!(e.message()))?;

    let (_, db) = super::connect().await?;

    let existing = user::Entity::find()
        .filter(user::Column::Role.eq(role::ADMIN_ROLE))
        .one(&db)
        .await?;
    if let Some(admin) = existing {
        println!(
            "{} admin account '{}' already exists, nothing to do",
            style("•").dim(),
            admin.username
        );
        return Ok(());
    }

    let admin = accounts::create_account(&db, username, password, role::ADMIN_ROLE)
        .await
        .map_err(|e| anyhow!("Failed to create admin: {}", e.message()))?;

    println!(
        "{} created admin '{}' (id {})",
        style("✔").green(),
        admin.username,
        admin.id
    );
    Ok(())
}
