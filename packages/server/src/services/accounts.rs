use sea_orm::*;

use crate::entity::{plugin, repository_ssh_key, role_permission, user};
use crate::error::AppError;
use crate::utils::hash;

/// Creates an account holding `role`. The username is stored trimmed.
pub async fn create_account<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    password: &str,
    role: &str,
) -> Result<user::Model, AppError> {
    let hash = hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    user::ActiveModel {
        username: Set(username.trim().to_string()),
        password: Set(hash),
        role: Set(role.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })
}

/// Checks a username/password pair. Unknown users and wrong passwords are
/// reported identically.
pub async fn authenticate<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    password: &str,
) -> Result<user::Model, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(conn)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = hash::verify_password(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if valid {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

/// Permissions granted to `role` right now, sorted by name.
pub async fn role_permissions<C: ConnectionTrait>(
    conn: &C,
    role: &str,
) -> Result<Vec<String>, DbErr> {
    Ok(role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .order_by_asc(role_permission::Column::Permission)
        .all(conn)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub submitted_plugins: u64,
    pub ssh_keys: u64,
}

pub async fn activity<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<Activity, DbErr> {
    let submitted_plugins = plugin::Entity::find()
        .filter(plugin::Column::SubmittedBy.eq(user_id))
        .count(conn)
        .await?;
    let ssh_keys = repository_ssh_key::Entity::find()
        .filter(repository_ssh_key::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(Activity {
        submitted_plugins,
        ssh_keys,
    })
}
