use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    auth::CurrentUser,
    db::{bookmarks, properties},
    error::{AppError, AppResult},
    state::AppState,
};

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_bookmark_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<String>,
) -> AppResult<Json<Value>> {
    if properties::find_by_id(&state.db, &property_id).await?.is_none() {
        return Err(AppError::NotFound("Property not found"));
    }

    let is_bookmarked = bookmarks::toggle(&state.db, &user.id, &property_id).await?;

    Ok(Json(json!({ "isBookmarked": is_bookmarked })))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn check_bookmark_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<String>,
) -> AppResult<Json<Value>> {
    let is_bookmarked = bookmarks::exists(&state.db, &user.id, &property_id).await?;

    Ok(Json(json!({ "isBookmarked": is_bookmarked })))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_bookmarks_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let bookmarks: Vec<Value> = bookmarks::list_property_ids(&state.db, &user.id)
        .await?
        .into_iter()
        .map(|property_id| json!({ "propertyId": property_id }))
        .collect();

    Ok(Json(json!({ "bookmarks": bookmarks })))
}
