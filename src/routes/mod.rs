pub mod auth;
pub mod bookings;
pub mod bookmarks;
pub mod chat;
pub mod dashboard;
pub mod extract;
pub mod properties;
pub mod ratings;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::{error::AppResult, providers::storage::UPLOADS_ROUTE, state::AppState};

/// A multipart upload may carry several files of up to `max_upload_bytes` each
const FILES_PER_UPLOAD: usize = 5;

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    // Credentialed CORS needs an explicit origin
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin).allow_credentials(true),
        Err(_) => {
            warn!("Ignoring invalid CORS origin {origin:?}");
            cors
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(Json(json!({ "status": "ok" })))
}

pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(FILES_PER_UPLOAD)
        .saturating_add(64 * 1024);

    let auth = Router::new()
        .route("/send-otp", post(auth::send_otp_handler))
        .route("/verify-otp", post(auth::verify_otp_handler))
        .route("/signup", post(auth::signup_handler))
        .route("/me", get(auth::me_handler))
        .route("/logout", post(auth::logout_handler));

    let property = Router::new()
        .route("/my-properties", get(properties::my_properties_handler))
        .route("/{id}", get(properties::get_property_handler))
        .route("/{id}/status", patch(properties::update_status_handler));

    let booking = Router::new()
        .route("/create", post(bookings::create_booking_handler))
        .route("/my-bookings", get(bookings::my_bookings_handler))
        .route("/payment", post(bookings::payment_handler))
        .route("/{id}/complete", patch(bookings::complete_booking_handler));

    let chat = Router::new()
        .route(
            "/conversations",
            get(chat::list_conversations_handler).post(chat::create_conversation_handler),
        )
        .route("/conversations/{id}", get(chat::get_conversation_handler))
        .route(
            "/messages",
            get(chat::list_messages_handler).post(chat::send_message_handler),
        )
        .route(
            "/upload",
            post(chat::upload_handler).layer(DefaultBodyLimit::max(upload_limit)),
        );

    let api = Router::new()
        .nest("/auth", auth)
        .route("/properties", get(properties::list_properties_handler))
        .route("/properties/sections", get(properties::sections_handler))
        .route("/property", post(properties::create_property_handler))
        .nest("/property", property)
        .route(
            "/bookmark/{property_id}",
            get(bookmarks::check_bookmark_handler).post(bookmarks::toggle_bookmark_handler),
        )
        .route("/bookmarks", get(bookmarks::list_bookmarks_handler))
        .nest("/booking", booking)
        .route("/rating/create", post(ratings::create_rating_handler))
        .nest("/chat", chat)
        .route("/dashboard/revenue", get(dashboard::revenue_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&state.config.upload_dir))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}
