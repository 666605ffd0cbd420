use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const OTP_LENGTH: usize = 6;

/// Six digit numeric code, never starting with zero
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

pub fn expires_at(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(ttl_minutes)
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}
