use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_cookies::Cookies;
use tracing::info;
use validator::Validate;

use super::extract::ValidJson;
use crate::{
    auth::{CurrentUser, Session, otp},
    db::{otps, users},
    error::{AppError, AppResult},
    models::{UserRole, VerificationStatus},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 32, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub documents: Option<Vec<String>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[tracing::instrument(skip(state, body))]
pub async fn send_otp_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<SendOtpRequest>,
) -> AppResult<Json<Value>> {
    let email = normalize_email(&body.email);

    let code = otp::generate_code();
    let expires_at = otp::expires_at(Utc::now(), state.config.otp_ttl_minutes);

    otps::replace_for_email(&state.db, &email, &code, expires_at).await?;
    state.mailer.send_otp(&email, &code).await?;

    info!(email, "OTP issued");

    Ok(Json(json!({ "message": "OTP sent successfully" })))
}

#[tracing::instrument(skip(state, cookies, body))]
pub async fn verify_otp_handler(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    ValidJson(body): ValidJson<VerifyOtpRequest>,
) -> AppResult<Json<Value>> {
    let email = normalize_email(&body.email);

    let otp = otps::find_latest_unused(&state.db, &email, &body.code)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired OTP"))?;

    if otp::is_expired(otp.expires_at, Utc::now()) {
        return Err(AppError::bad_request("OTP has expired"));
    }

    if !otps::mark_used(&state.db, &otp.id).await? {
        return Err(AppError::bad_request("Invalid or expired OTP"));
    }

    let user = users::find_or_create(&state.db, &email).await?;

    let token = state.sessions.issue(&user)?;
    cookies.add(state.sessions.cookie(token));

    info!(user_id = %user.id, "Signed in");

    Ok(Json(json!({
        "message": "OTP verified successfully",
        "user": user.profile(),
    })))
}

/// Complete or amend the profile of the signed-in email
#[tracing::instrument(skip(state, claims, body), fields(user_id = %claims.sub))]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Session(claims): Session,
    ValidJson(body): ValidJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let email = normalize_email(&body.email);
    if email != claims.email {
        return Err(AppError::bad_request("Email mismatch"));
    }

    // Owners go back into review whenever they (re)submit
    let verification_status = (body.role == Some(UserRole::Owner)).then_some(VerificationStatus::Pending);

    let (user, status, message) = match users::find_by_email(&state.db, &email).await? {
        Some(existing) => {
            let update = users::ProfileUpdate {
                name: body.name,
                phone: body.phone,
                role: body.role,
                documents: body.documents,
                verification_status,
            };
            let user = users::update_profile(&state.db, &existing.id, update).await?;
            (user, StatusCode::OK, "Account updated successfully")
        }
        None => {
            let role = body.role.unwrap_or(UserRole::Customer);
            let created = users::create(&state.db, Some(&claims.sub), &email, role).await?;
            let update = users::ProfileUpdate {
                name: body.name,
                phone: body.phone,
                role: None,
                documents: body.documents,
                verification_status,
            };
            let user = users::update_profile(&state.db, &created.id, update).await?;
            (user, StatusCode::CREATED, "Account created successfully")
        }
    };

    Ok((
        status,
        Json(json!({
            "message": message,
            "user": user.profile(),
        })),
    ))
}

pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user.profile() }))
}

pub async fn logout_handler(State(state): State<Arc<AppState>>, cookies: Cookies) -> Json<Value> {
    // Bearer-only clients never sent the cookie, so overwrite rather than remove
    cookies.add(state.sessions.removal_cookie());

    Json(json!({ "message": "Signed out" }))
}
