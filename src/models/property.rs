use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{PropertyCategory, PropertyStatus, PropertyType, UserSummary};

/// Core property data model
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub category: PropertyCategory,
    pub status: PropertyStatus,
    pub price: f64,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    #[sqlx(json)]
    pub amenities: Vec<String>,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn summary(&self) -> PropertySummary {
        PropertySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            images: self.images.clone(),
        }
    }
}

/// Property detail page payload
#[derive(Debug, Clone, Serialize)]
pub struct PropertyWithOwner {
    #[serde(flatten)]
    pub property: Property,
    pub owner: UserSummary,
}

/// Compact listing reference embedded in bookings and conversations
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertySummary {
    pub id: String,
    pub title: String,
    pub images: Vec<String>,
}

/// Row shown on the owner's "my properties" dashboard
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnerListing {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub category: PropertyCategory,
    pub status: PropertyStatus,
    pub price: f64,
    pub city: String,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PropertyCategory {
    pub const ALL: [PropertyCategory; 2] = [PropertyCategory::Rent, PropertyCategory::Buy];

    /// Property types that may be listed under this category
    pub fn allowed_types(self) -> &'static [PropertyType] {
        match self {
            PropertyCategory::Rent => &[
                PropertyType::Room,
                PropertyType::House,
                PropertyType::Apartment,
                PropertyType::Villa,
            ],
            PropertyCategory::Buy => &[PropertyType::House, PropertyType::Apartment],
        }
    }
}

impl PropertyType {
    pub fn is_valid_for(self, category: PropertyCategory) -> bool {
        category.allowed_types().contains(&self)
    }
}
