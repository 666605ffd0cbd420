use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    db::{bookings, revenues},
    error::{AppError, AppResult},
    models::{BookingStatus, Revenue},
    state::AppState,
};

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Weekly,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct BookingCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl BookingCounts {
    fn from_rows(rows: Vec<(BookingStatus, i64)>) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                BookingStatus::Pending => counts.pending += count,
                BookingStatus::Confirmed => counts.confirmed += count,
                BookingStatus::Completed => counts.completed += count,
                BookingStatus::Cancelled => counts.cancelled += count,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RevenueBucket {
    pub period: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub period: Period,
    pub total_revenue: f64,
    pub bookings: BookingCounts,
    pub buckets: Vec<RevenueBucket>,
}

fn bucket_key(revenue: &Revenue, period: Period) -> String {
    match period {
        Period::Monthly => revenue.created_at.format("%Y-%m").to_string(),
        Period::Weekly => {
            let week = revenue.created_at.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
    }
}

/// Sum revenue per calendar month or ISO week, oldest bucket first
pub fn bucket_revenue(revenues: &[Revenue], period: Period) -> Vec<RevenueBucket> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for revenue in revenues {
        *buckets.entry(bucket_key(revenue, period)).or_default() += revenue.amount;
    }

    buckets
        .into_iter()
        .map(|(period, amount)| RevenueBucket { period, amount })
        .collect()
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn revenue_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RevenueQuery>,
) -> AppResult<Json<RevenueReport>> {
    if !user.is_owner() {
        return Err(AppError::Forbidden);
    }

    let revenues = revenues::list_for_owner(&state.db, &user.id).await?;
    let counts = bookings::status_counts_for_owner(&state.db, &user.id).await?;

    Ok(Json(RevenueReport {
        period: query.period,
        total_revenue: revenues.iter().map(|r| r.amount).sum(),
        bookings: BookingCounts::from_rows(counts),
        buckets: bucket_revenue(&revenues, query.period),
    }))
}
