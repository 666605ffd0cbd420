use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{BookingStatus, PaymentStatus, PropertyCategory, PropertySummary, UserSummary};

/// A customer's request to rent or buy a listing, tracked through to payment and completion
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub customer_id: String,
    pub owner_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub booking_type: PropertyCategory,
    pub status: BookingStatus,
    pub payment_status: Option<PaymentStatus>,
    pub payment_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub meeting_date: Option<DateTime<Utc>>,
    pub meeting_location: Option<String>,
    pub meeting_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn involves(&self, user_id: &str) -> bool {
        self.customer_id == user_id || self.owner_id == user_id
    }
}

/// Booking as listed on a user's dashboard
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithParties {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertySummary,
    pub customer: UserSummary,
    pub owner: UserSummary,
    /// Ratings the requesting user left on this booking
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub booking_id: String,
    pub rater_id: String,
    pub rated_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Income credited to an owner when a booking is paid
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub id: String,
    pub owner_id: String,
    pub property_id: String,
    pub booking_id: String,
    pub amount: f64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub revenue_type: PropertyCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
