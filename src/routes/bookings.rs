use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use validator::Validate;

use super::extract::ValidJson;
use crate::{
    auth::CurrentUser,
    db::{
        bookings::{self, NewBooking, PaymentRecord},
        properties,
        revenues::{self, NewRevenue},
    },
    error::{AppError, AppResult},
    models::{BookingStatus, PaymentStatus, PropertyCategory},
    providers::PaymentRequest,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "propertyId is required"))]
    pub property_id: String,
    #[serde(rename = "type")]
    pub booking_type: PropertyCategory,
    pub meeting_date: Option<String>,
    #[validate(length(max = 500, message = "Meeting location is too long"))]
    pub meeting_location: Option<String>,
    #[validate(length(max = 2000, message = "Meeting notes are too long"))]
    pub meeting_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestBody {
    #[validate(length(min = 1, message = "bookingId is required"))]
    pub booking_id: String,
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than zero"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
}

fn parse_meeting_date(raw: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| AppError::bad_request("Invalid meeting date"))
        })
        .transpose()
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let meeting_date = parse_meeting_date(body.meeting_date)?;

    let property = properties::find_by_id(&state.db, &body.property_id)
        .await?
        .ok_or(AppError::NotFound("Property not found"))?;

    if property.owner_id == user.id {
        return Err(AppError::bad_request("Cannot book your own property"));
    }

    let booking = bookings::insert(
        &state.db,
        NewBooking {
            property_id: property.id.clone(),
            customer_id: user.id.clone(),
            owner_id: property.owner_id.clone(),
            booking_type: body.booking_type,
            meeting_date,
            meeting_location: body.meeting_location,
            meeting_notes: body.meeting_notes,
        },
    )
    .await?;

    info!(booking_id = %booking.id, property_id = %property.id, "Booking created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "booking": booking,
        })),
    ))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_bookings_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let bookings = bookings::list_for_user(&state.db, &user.id).await?;

    Ok(Json(json!({ "bookings": bookings })))
}

/// Charge the customer for a rental and credit the owner
#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id, booking_id = %body.booking_id))]
pub async fn payment_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<PaymentRequestBody>,
) -> AppResult<Json<Value>> {
    let booking = bookings::find_by_id(&state.db, &body.booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found"))?;

    if booking.customer_id != user.id {
        return Err(AppError::Forbidden);
    }
    if booking.booking_type != PropertyCategory::Rent {
        return Err(AppError::bad_request("Payment only available for rent bookings"));
    }
    if booking.payment_status == Some(PaymentStatus::Paid) {
        return Err(AppError::bad_request("Booking already paid"));
    }
    if !booking.status.is_payable() {
        return Err(AppError::bad_request("Only pending or confirmed bookings can be paid"));
    }

    let property = properties::find_by_id(&state.db, &booking.property_id)
        .await?
        .ok_or(AppError::NotFound("Property not found"))?;

    let intent_id = state
        .payments
        .charge(&PaymentRequest {
            booking_id: booking.id.clone(),
            customer_id: user.id.clone(),
            amount: body.amount,
            method: body.payment_method.clone(),
            description: format!("Rent payment for {}", property.title),
        })
        .await?;

    let payment = PaymentRecord {
        amount: body.amount,
        method: body.payment_method,
        intent_id,
        paid_at: Utc::now(),
    };

    // A concurrent request may have settled the booking while the charge was in flight
    let mut tx = state.db.begin().await?;
    let Some(paid) = bookings::mark_paid(&mut *tx, &booking.id, &payment).await? else {
        warn!(intent_id = %payment.intent_id, "Booking settled during charge, discarding payment");
        return Err(AppError::bad_request("Booking already paid"));
    };
    revenues::insert(
        &mut *tx,
        NewRevenue {
            owner_id: booking.owner_id.clone(),
            property_id: property.id.clone(),
            booking_id: booking.id.clone(),
            amount: payment.amount,
            revenue_type: PropertyCategory::Rent,
            description: format!("Rent payment for {}", property.title),
        },
    )
    .await?;
    tx.commit().await?;

    info!(intent_id = %payment.intent_id, amount = payment.amount, "Payment recorded");

    Ok(Json(json!({
        "message": "Payment successful",
        "booking": paid,
    })))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn complete_booking_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let booking = bookings::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound("Booking not found"))?;

    if !booking.involves(&user.id) {
        return Err(AppError::Forbidden);
    }

    let booking = match booking.status {
        BookingStatus::Cancelled => {
            return Err(AppError::bad_request("Cannot complete a cancelled booking"));
        }
        BookingStatus::Completed => booking,
        BookingStatus::Pending | BookingStatus::Confirmed => {
            let completed = bookings::complete(&state.db, &booking.id).await?;
            info!(booking_id = %completed.id, "Booking completed");
            completed
        }
    };

    Ok(Json(json!({
        "message": "Booking marked as completed",
        "booking": booking,
    })))
}
