use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use validator::Validate;

use super::extract::ValidJson;
use crate::{
    auth::CurrentUser,
    db::{
        bookings,
        ratings::{self, NewRating},
    },
    error::{AppError, AppResult},
    models::BookingStatus,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    #[validate(length(min = 1, message = "bookingId is required"))]
    pub booking_id: String,
    #[validate(length(min = 1, message = "ratedId is required"))]
    pub rated_id: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[validate(length(max = 1000, message = "Comment is too long"))]
    pub comment: Option<String>,
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id, booking_id = %body.booking_id))]
pub async fn create_rating_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<CreateRatingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let booking = bookings::find_by_id(&state.db, &body.booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found"))?;

    if booking.status != BookingStatus::Completed {
        return Err(AppError::bad_request("Can only rate completed bookings"));
    }
    if !booking.involves(&user.id) {
        return Err(AppError::Forbidden);
    }
    if !booking.involves(&body.rated_id) {
        return Err(AppError::bad_request("Invalid user to rate"));
    }
    if body.rated_id == user.id {
        return Err(AppError::bad_request("Cannot rate yourself"));
    }

    let rating = ratings::insert(
        &state.db,
        NewRating {
            booking_id: booking.id.clone(),
            rater_id: user.id.clone(),
            rated_id: body.rated_id,
            rating: body.rating,
            comment: body.comment.filter(|c| !c.trim().is_empty()),
        },
    )
    .await?
    .ok_or_else(|| AppError::bad_request("Rating already submitted"))?;

    info!(rating_id = %rating.id, "Rating submitted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Rating submitted successfully",
            "rating": rating,
        })),
    ))
}
