use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{PropertyCategory, Revenue, new_id};

#[derive(Debug, Clone)]
pub struct NewRevenue {
    pub owner_id: String,
    pub property_id: String,
    pub booking_id: String,
    pub amount: f64,
    pub revenue_type: PropertyCategory,
    pub description: String,
}

#[tracing::instrument(skip(executor))]
pub async fn insert<'e, E>(executor: E, revenue: NewRevenue) -> Result<Revenue>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Revenue>(
        r#"
        INSERT INTO revenues (id, owner_id, property_id, booking_id, amount, type, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&revenue.owner_id)
    .bind(&revenue.property_id)
    .bind(&revenue.booking_id)
    .bind(revenue.amount)
    .bind(revenue.revenue_type)
    .bind(&revenue.description)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
    .context("unable to record revenue")
}

#[tracing::instrument(skip(db))]
pub async fn list_for_owner(db: &SqlitePool, owner_id: &str) -> Result<Vec<Revenue>> {
    sqlx::query_as::<_, Revenue>(
        "SELECT * FROM revenues WHERE owner_id = ? ORDER BY created_at ASC",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("unable to list revenue")
}
