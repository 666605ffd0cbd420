use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use super::ratings;
use crate::models::{
    Booking, BookingStatus, BookingWithParties, PaymentStatus, PropertyCategory, PropertySummary,
    UserSummary, new_id,
};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: String,
    pub customer_id: String,
    pub owner_id: String,
    pub booking_type: PropertyCategory,
    pub meeting_date: Option<DateTime<Utc>>,
    pub meeting_location: Option<String>,
    pub meeting_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub amount: f64,
    pub method: String,
    pub intent_id: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct BookingListRow {
    #[sqlx(flatten)]
    booking: Booking,
    property_title: String,
    #[sqlx(json)]
    property_images: Vec<String>,
    customer_name: Option<String>,
    customer_email: String,
    owner_name: Option<String>,
    owner_email: String,
}

#[tracing::instrument(skip(db))]
pub async fn insert(db: &SqlitePool, booking: NewBooking) -> Result<Booking> {
    let now = Utc::now();
    // Only rentals go through the payment flow
    let payment_status = match booking.booking_type {
        PropertyCategory::Rent => Some(PaymentStatus::Pending),
        PropertyCategory::Buy => None,
    };

    sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (
            id, property_id, customer_id, owner_id, type, status, payment_status,
            meeting_date, meeting_location, meeting_notes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&booking.property_id)
    .bind(&booking.customer_id)
    .bind(&booking.owner_id)
    .bind(booking.booking_type)
    .bind(BookingStatus::Pending)
    .bind(payment_status)
    .bind(booking.meeting_date)
    .bind(&booking.meeting_location)
    .bind(&booking.meeting_notes)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .context("unable to create booking")
}

#[tracing::instrument(skip(db))]
pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<Booking>> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("unable to fetch booking")
}

/// Bookings the user takes part in as customer or owner, newest first
#[tracing::instrument(skip(db))]
pub async fn list_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<BookingWithParties>> {
    let rows = sqlx::query_as::<_, BookingListRow>(
        r#"
        SELECT
            b.*,
            p.title AS property_title,
            p.images AS property_images,
            c.name AS customer_name,
            c.email AS customer_email,
            o.name AS owner_name,
            o.email AS owner_email
        FROM bookings b
        JOIN properties p ON p.id = b.property_id
        JOIN users c ON c.id = b.customer_id
        JOIN users o ON o.id = b.owner_id
        WHERE b.customer_id = ? OR b.owner_id = ?
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("unable to list bookings")?;

    let mut ratings_by_booking = HashMap::<String, Vec<_>>::new();
    for rating in ratings::list_by_rater(db, user_id).await? {
        ratings_by_booking
            .entry(rating.booking_id.clone())
            .or_default()
            .push(rating);
    }

    let bookings = rows
        .into_iter()
        .map(|row| {
            let booking = row.booking;
            BookingWithParties {
                property: PropertySummary {
                    id: booking.property_id.clone(),
                    title: row.property_title,
                    images: row.property_images,
                },
                customer: UserSummary {
                    id: booking.customer_id.clone(),
                    name: row.customer_name,
                    email: row.customer_email,
                },
                owner: UserSummary {
                    id: booking.owner_id.clone(),
                    name: row.owner_name,
                    email: row.owner_email,
                },
                ratings: ratings_by_booking.remove(&booking.id).unwrap_or_default(),
                booking,
            }
        })
        .collect();

    Ok(bookings)
}

/// Record a successful payment and confirm the booking.
///
/// Returns `None` when the booking is already paid or no longer pending or confirmed,
/// so two overlapping payments cannot both settle it.
#[tracing::instrument(skip(executor))]
pub async fn mark_paid<'e, E>(executor: E, id: &str, payment: &PaymentRecord) -> Result<Option<Booking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings SET
            payment_status = ?,
            payment_amount = ?,
            payment_method = ?,
            payment_intent_id = ?,
            payment_date = ?,
            status = ?,
            updated_at = ?
        WHERE id = ?
          AND (payment_status IS NULL OR payment_status != ?)
          AND status IN (?, ?)
        RETURNING *
        "#,
    )
    .bind(PaymentStatus::Paid)
    .bind(payment.amount)
    .bind(&payment.method)
    .bind(&payment.intent_id)
    .bind(payment.paid_at)
    .bind(BookingStatus::Confirmed)
    .bind(payment.paid_at)
    .bind(id)
    .bind(PaymentStatus::Paid)
    .bind(BookingStatus::Pending)
    .bind(BookingStatus::Confirmed)
    .fetch_optional(executor)
    .await
    .context("unable to record payment")
}

#[tracing::instrument(skip(db))]
pub async fn complete(db: &SqlitePool, id: &str) -> Result<Booking> {
    let now = Utc::now();

    sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = ?, completed_at = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(BookingStatus::Completed)
    .bind(now)
    .bind(now)
    .bind(id)
    .fetch_one(db)
    .await
    .context("unable to complete booking")
}

/// Number of bookings per status on an owner's listings
#[tracing::instrument(skip(db))]
pub async fn status_counts_for_owner(
    db: &SqlitePool,
    owner_id: &str,
) -> Result<Vec<(BookingStatus, i64)>> {
    sqlx::query_as::<_, (BookingStatus, i64)>(
        "SELECT status, COUNT(*) FROM bookings WHERE owner_id = ? GROUP BY status",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("unable to count bookings")
}
