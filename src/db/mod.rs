//! # Database
//!
//! SQLite store behind an `sqlx` pool. Schema lives in `migrations/` and is
//! embedded into the binary, so a fresh database file is usable on first start.
//!
//! Every table keys on UUID v4 text ids. Timestamps are written from Rust as
//! UTC and stored as RFC 3339 text, which keeps `ORDER BY created_at` correct.
//! List columns (images, amenities, attachments) are JSON text.

pub mod bookings;
pub mod bookmarks;
pub mod conversations;
pub mod messages;
pub mod otps;
pub mod properties;
pub mod ratings;
pub mod revenues;
pub mod users;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the pool and bring the schema up to date
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database url {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Each in-memory connection is its own database, so pin to a single one
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await
    }
    .context("Failed to connect to database")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database ready at {database_url}");

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:").await.unwrap()
}
