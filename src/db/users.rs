use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json};

use crate::models::{User, UserRole, UserSummary, VerificationStatus, new_id};

/// Fields a signup may change; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub documents: Option<Vec<String>>,
    pub verification_status: Option<VerificationStatus>,
}

#[tracing::instrument(skip(db))]
pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("unable to fetch user")
}

#[tracing::instrument(skip(db))]
pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
        .context("unable to fetch user by email")
}

#[tracing::instrument(skip(db))]
pub async fn find_summary(db: &SqlitePool, id: &str) -> Result<Option<UserSummary>> {
    sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("unable to fetch user summary")
}

/// Insert a bare account. `id` lets a session subject be recreated under the same identifier.
#[tracing::instrument(skip(db))]
pub async fn create(db: &SqlitePool, id: Option<&str>, email: &str, role: UserRole) -> Result<User> {
    let now = Utc::now();
    let id = id.map(str::to_string).unwrap_or_else(new_id);

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .context("unable to create user")
}

/// Passwordless sign-in creates customers on first successful code entry
pub async fn find_or_create(db: &SqlitePool, email: &str) -> Result<User> {
    if let Some(user) = find_by_email(db, email).await? {
        return Ok(user);
    }

    create(db, None, email, UserRole::Customer).await
}

#[tracing::instrument(skip(db, update))]
pub async fn update_profile(db: &SqlitePool, id: &str, update: ProfileUpdate) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            phone = COALESCE(?, phone),
            role = COALESCE(?, role),
            verification_documents = COALESCE(?, verification_documents),
            verification_status = COALESCE(?, verification_status),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(update.name)
    .bind(update.phone)
    .bind(update.role)
    .bind(update.documents.map(Json))
    .bind(update.verification_status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(db)
    .await
    .context("unable to update user profile")
}
