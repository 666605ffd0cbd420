use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Rating, new_id};

#[derive(Debug, Clone)]
pub struct NewRating {
    pub booking_id: String,
    pub rater_id: String,
    pub rated_id: String,
    pub rating: i64,
    pub comment: Option<String>,
}

/// `None` when the rater already rated this booking
#[tracing::instrument(skip(db))]
pub async fn insert(db: &SqlitePool, rating: NewRating) -> Result<Option<Rating>> {
    sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings (id, booking_id, rater_id, rated_id, rating, comment, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (booking_id, rater_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&rating.booking_id)
    .bind(&rating.rater_id)
    .bind(&rating.rated_id)
    .bind(rating.rating)
    .bind(&rating.comment)
    .bind(Utc::now())
    .fetch_optional(db)
    .await
    .context("unable to create rating")
}

#[tracing::instrument(skip(db))]
pub async fn list_by_rater(db: &SqlitePool, rater_id: &str) -> Result<Vec<Rating>> {
    sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE rater_id = ? ORDER BY created_at")
        .bind(rater_id)
        .fetch_all(db)
        .await
        .context("unable to list ratings")
}
