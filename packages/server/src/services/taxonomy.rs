//! Get-or-create lookups for the named catalogue tables.
//!
//! Each insert uses `ON CONFLICT DO NOTHING` so concurrent ingestions naming
//! the same author, category or tag converge on one row.

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::{author, category, tag};

fn tolerate_conflict(result: Result<u64, DbErr>) -> Result<(), DbErr> {
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

pub async fn get_or_create_author<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<author::Model, DbErr> {
    let find = || author::Entity::find().filter(author::Column::Name.eq(name));
    if let Some(existing) = find().one(conn).await? {
        return Ok(existing);
    }

    tolerate_conflict(
        author::Entity::insert(author::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        })
        .on_conflict(OnConflict::column(author::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await,
    )?;

    find()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("author '{name}'")))
}

pub async fn get_or_create_category<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<category::Model, DbErr> {
    let find = || category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(existing) = find().one(conn).await? {
        return Ok(existing);
    }

    tolerate_conflict(
        category::Entity::insert(category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        })
        .on_conflict(OnConflict::column(category::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await,
    )?;

    find()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("category '{name}'")))
}

pub async fn get_or_create_tag<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<tag::Model, DbErr> {
    let find = || tag::Entity::find().filter(tag::Column::Name.eq(name));
    if let Some(existing) = find().one(conn).await? {
        return Ok(existing);
    }

    tolerate_conflict(
        tag::Entity::insert(tag::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        })
        .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await,
    )?;

    find()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tag '{name}'")))
}
