use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::new_id;

#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub id: String,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Discard any outstanding codes for the email and store a new one
#[tracing::instrument(skip(db, code))]
pub async fn replace_for_email(
    db: &SqlitePool,
    email: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<OtpRecord> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM otps WHERE email = ? AND used = FALSE")
        .bind(email)
        .execute(&mut *tx)
        .await
        .context("unable to clear pending codes")?;

    let otp = sqlx::query_as::<_, OtpRecord>(
        r#"
        INSERT INTO otps (id, email, code, expires_at, used, created_at)
        VALUES (?, ?, ?, ?, FALSE, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(email)
    .bind(code)
    .bind(expires_at)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .context("unable to store code")?;

    tx.commit().await?;

    Ok(otp)
}

#[tracing::instrument(skip(db, code))]
pub async fn find_latest_unused(db: &SqlitePool, email: &str, code: &str) -> Result<Option<OtpRecord>> {
    sqlx::query_as::<_, OtpRecord>(
        r#"
        SELECT * FROM otps
        WHERE email = ? AND code = ? AND used = FALSE
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(email)
    .bind(code)
    .fetch_optional(db)
    .await
    .context("unable to look up code")
}

/// Returns false when another request consumed the code first
#[tracing::instrument(skip(db))]
pub async fn mark_used(db: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE otps SET used = TRUE WHERE id = ? AND used = FALSE")
        .bind(id)
        .execute(db)
        .await
        .context("unable to consume code")?;

    Ok(result.rows_affected() == 1)
}
