//! # Auth
//!
//! Passwordless: a six digit code is mailed to the user, and a correct code
//! trades for a signed session token. The token rides in an http-only
//! `session` cookie for the browser, or an `Authorization: Bearer` header for
//! other clients.

pub mod otp;
pub mod session;

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tower_cookies::Cookies;

pub use session::{Claims, SESSION_COOKIE, SessionKeys};

use crate::{db::users, error::AppError, models::User, state::AppState};

/// Verified session claims, without requiring the account row to exist
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

/// The signed-in account
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

async fn session_token(parts: &mut Parts, state: &Arc<AppState>) -> Option<String> {
    if let Some(token) = bearer_token(parts) {
        return Some(token);
    }

    let cookies = Cookies::from_request_parts(parts, state).await.ok()?;
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)
            .await
            .ok_or(AppError::Unauthorized)?;

        state
            .sessions
            .verify(&token)
            .map(Session)
            .ok_or(AppError::Unauthorized)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;

        // Accounts can disappear while a token is still live
        users::find_by_id(&state.db, &claims.sub)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
