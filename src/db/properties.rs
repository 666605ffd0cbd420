use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json};

use crate::models::{
    OwnerListing, Property, PropertyCategory, PropertyStatus, PropertyType, new_id,
};

/// Listing data supplied by an owner
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub category: PropertyCategory,
    pub price: f64,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
}

/// Browse filters; every field is optional
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category: Option<PropertyCategory>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub query: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[tracing::instrument(skip(db, property), fields(owner_id = %property.owner_id))]
pub async fn insert(db: &SqlitePool, property: NewProperty) -> Result<Property> {
    let now = Utc::now();

    sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties (
            id, owner_id, title, description, type, category, status, price,
            address, city, state, bedrooms, bathrooms, area, amenities, images,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&property.owner_id)
    .bind(&property.title)
    .bind(&property.description)
    .bind(property.property_type)
    .bind(property.category)
    .bind(PropertyStatus::Available)
    .bind(property.price)
    .bind(&property.address)
    .bind(&property.city)
    .bind(&property.state)
    .bind(property.bedrooms)
    .bind(property.bathrooms)
    .bind(property.area)
    .bind(Json(&property.amenities))
    .bind(Json(&property.images))
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .context("unable to create property")
}

#[tracing::instrument(skip(db))]
pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<Property>> {
    sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("unable to fetch property")
}

/// Available listings matching the filter, newest first
#[tracing::instrument(skip(db))]
pub async fn list_available(db: &SqlitePool, filter: &ListingFilter) -> Result<Vec<Property>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM properties WHERE status = ");
    query.push_bind(PropertyStatus::Available);

    // Hide listings whose type is not offered under their category
    query.push(" AND (");
    for (i, category) in PropertyCategory::ALL.into_iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push("(category = ").push_bind(category).push(" AND type IN (");
        let mut types = query.separated(", ");
        for property_type in category.allowed_types() {
            types.push_bind(*property_type);
        }
        types.push_unseparated("))");
    }
    query.push(")");

    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category);
    }
    if let Some(property_type) = filter.property_type {
        query.push(" AND type = ").push_bind(property_type);
    }
    if let Some(city) = &filter.city {
        query.push(" AND LOWER(city) = LOWER(").push_bind(city.clone()).push(")");
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(text) = &filter.query {
        let pattern = format!("%{text}%");
        query
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR city LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    query
        .build_query_as::<Property>()
        .fetch_all(db)
        .await
        .context("unable to list properties")
}

#[tracing::instrument(skip(db))]
pub async fn list_for_owner(db: &SqlitePool, owner_id: &str) -> Result<Vec<OwnerListing>> {
    sqlx::query_as::<_, OwnerListing>(
        r#"
        SELECT id, title, type, category, status, price, city, images, created_at
        FROM properties
        WHERE owner_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("unable to list owner properties")
}

#[tracing::instrument(skip(db))]
pub async fn update_status(db: &SqlitePool, id: &str, status: PropertyStatus) -> Result<Property> {
    sqlx::query_as::<_, Property>(
        "UPDATE properties SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(db)
    .await
    .context("unable to update property status")
}

#[cfg(test)]
pub(crate) fn sample(owner_id: &str, category: PropertyCategory, property_type: PropertyType) -> NewProperty {
    NewProperty {
        owner_id: owner_id.to_string(),
        title: "Sunny loft".to_string(),
        description: "Top floor, lots of light".to_string(),
        property_type,
        category,
        price: 2400.0,
        address: "12 Congress Ave".to_string(),
        city: "Austin".to_string(),
        state: Some("TX".to_string()),
        bedrooms: Some(2),
        bathrooms: Some(1),
        area: Some(850.0),
        amenities: vec!["Parking".to_string()],
        images: vec!["https://images.example.com/loft.jpg".to_string()],
    }
}
