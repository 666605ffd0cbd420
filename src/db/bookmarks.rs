use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::new_id;

#[tracing::instrument(skip(db))]
pub async fn exists(db: &SqlitePool, user_id: &str, property_id: &str) -> Result<bool> {
    let found: Option<String> = sqlx::query_scalar(
        "SELECT id FROM bookmarks WHERE user_id = ? AND property_id = ?",
    )
    .bind(user_id)
    .bind(property_id)
    .fetch_optional(db)
    .await
    .context("unable to check bookmark")?;

    Ok(found.is_some())
}

/// Flip the bookmark and report whether the property is now saved
#[tracing::instrument(skip(db))]
pub async fn toggle(db: &SqlitePool, user_id: &str, property_id: &str) -> Result<bool> {
    let mut tx = db.begin().await?;

    let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND property_id = ?")
        .bind(user_id)
        .bind(property_id)
        .execute(&mut *tx)
        .await
        .context("unable to remove bookmark")?
        .rows_affected();

    if removed == 0 {
        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, user_id, property_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, property_id) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(property_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("unable to create bookmark")?;
    }

    tx.commit().await?;

    Ok(removed == 0)
}

#[tracing::instrument(skip(db))]
pub async fn list_property_ids(db: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT property_id FROM bookmarks WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("unable to list bookmarks")
}
