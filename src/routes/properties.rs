use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use validator::Validate;

use super::extract::ValidJson;
use crate::{
    auth::CurrentUser,
    db::{
        properties::{self, ListingFilter, NewProperty},
        users,
    },
    error::{AppError, AppResult},
    models::{Property, PropertyCategory, PropertyStatus, PropertyType, PropertyWithOwner},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub category: Option<PropertyCategory>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListingQuery> for ListingFilter {
    fn from(query: ListingQuery) -> Self {
        let non_empty = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        ListingFilter {
            category: query.category,
            property_type: query.property_type,
            city: non_empty(query.city),
            min_price: query.min_price,
            max_price: query.max_price,
            query: non_empty(query.q),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub category: PropertyCategory,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than zero"))]
    pub price: f64,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(range(min = 0, message = "Bedrooms cannot be negative"))]
    pub bedrooms: Option<i64>,
    #[validate(range(min = 0, message = "Bathrooms cannot be negative"))]
    pub bathrooms: Option<i64>,
    #[validate(range(exclusive_min = 0.0, message = "Area must be greater than zero"))]
    pub area: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: PropertyStatus,
}

#[tracing::instrument(skip(state))]
pub async fn list_properties_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<Vec<Property>>> {
    let filter = ListingFilter::from(query);

    Ok(Json(properties::list_available(&state.db, &filter).await?))
}

async fn section(state: &AppState, category: PropertyCategory) -> AppResult<Vec<Property>> {
    let filter = ListingFilter {
        category: Some(category),
        limit: MAX_PAGE_SIZE,
        ..Default::default()
    };

    Ok(properties::list_available(&state.db, &filter).await?)
}

/// Home page rails: available rentals and sales side by side
#[tracing::instrument(skip(state))]
pub async fn sections_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let rent = section(&state, PropertyCategory::Rent).await?;
    let buy = section(&state, PropertyCategory::Buy).await?;

    Ok(Json(json!({ "rent": rent, "buy": buy })))
}

#[tracing::instrument(skip(state))]
pub async fn get_property_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let property = properties::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound("Property not found"))?;

    let owner = users::find_summary(&state.db, &property.owner_id)
        .await?
        .ok_or(AppError::NotFound("Property not found"))?;

    Ok(Json(json!({ "property": PropertyWithOwner { property, owner } })))
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_property_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<CreatePropertyRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if !user.is_owner() {
        return Err(AppError::Forbidden);
    }

    if !body.property_type.is_valid_for(body.category) {
        return Err(AppError::bad_request(format!(
            "Property type is not available for {} listings",
            body.category.as_str()
        )));
    }

    let property = properties::insert(
        &state.db,
        NewProperty {
            owner_id: user.id.clone(),
            title: body.title.trim().to_string(),
            description: body.description,
            property_type: body.property_type,
            category: body.category,
            price: body.price,
            address: body.address.trim().to_string(),
            city: body.city.trim().to_string(),
            state: body.state,
            bedrooms: body.bedrooms,
            bathrooms: body.bathrooms,
            area: body.area,
            amenities: body.amenities,
            images: body.images,
        },
    )
    .await?;

    info!(property_id = %property.id, "Property listed");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Property created successfully",
            "property": property,
        })),
    ))
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateStatusRequest>,
) -> AppResult<Json<Value>> {
    let property = properties::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound("Property not found"))?;

    if property.owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let updated = properties::update_status(&state.db, &property.id, body.status).await?;

    info!(property_id = %updated.id, status = updated.status.as_str(), "Property status changed");

    Ok(Json(json!({
        "message": "Property status updated",
        "property": { "id": updated.id, "status": updated.status },
    })))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_properties_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let listings = properties::list_for_owner(&state.db, &user.id).await?;

    Ok(Json(json!({ "properties": listings })))
}
