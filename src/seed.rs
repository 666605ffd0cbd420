use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    db::{
        properties::{self, NewProperty},
        users::{self, ProfileUpdate},
    },
    models::{PropertyCategory, PropertyType, UserRole, VerificationStatus},
};

pub const DEMO_OWNER_EMAIL: &str = "demo-owner@rambo.local";

/// Listings for a fresh install so the browse pages are not empty
fn demo_listings(owner_id: &str) -> Vec<NewProperty> {
    let listing = |title: &str,
                   property_type: PropertyType,
                   category: PropertyCategory,
                   price: f64,
                   address: &str,
                   city: &str,
                   state: &str,
                   bedrooms: i64,
                   area: f64,
                   amenities: &[&str]| NewProperty {
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        description: format!("{title} in {city}. {bedrooms} bedrooms, {area} sq ft."),
        property_type,
        category,
        price,
        address: address.to_string(),
        city: city.to_string(),
        state: Some(state.to_string()),
        bedrooms: Some(bedrooms),
        bathrooms: Some(((bedrooms + 1) / 2).max(1)),
        area: Some(area),
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
        images: vec![],
    };

    vec![
        listing(
            "Bright studio room near campus",
            PropertyType::Room,
            PropertyCategory::Rent,
            950.0,
            "2100 Guadalupe St",
            "Austin",
            "TX",
            1,
            320.0,
            &["Wifi", "Laundry"],
        ),
        listing(
            "Two bedroom apartment with balcony",
            PropertyType::Apartment,
            PropertyCategory::Rent,
            2450.0,
            "120 Pine St",
            "Seattle",
            "WA",
            2,
            870.0,
            &["Elevator", "Balcony"],
        ),
        listing(
            "Hillside villa with pool",
            PropertyType::Villa,
            PropertyCategory::Rent,
            6800.0,
            "8 Canyon Rd",
            "Austin",
            "TX",
            5,
            3900.0,
            &["Pool", "Garage", "Garden"],
        ),
        listing(
            "Family house on a quiet street",
            PropertyType::House,
            PropertyCategory::Buy,
            615_000.0,
            "44 Maple Ave",
            "Portland",
            "OR",
            4,
            2200.0,
            &["Garage", "Garden"],
        ),
        listing(
            "Downtown condo",
            PropertyType::Apartment,
            PropertyCategory::Buy,
            489_000.0,
            "900 Main St",
            "Denver",
            "CO",
            2,
            1050.0,
            &["Elevator", "Gym"],
        ),
    ]
}

/// Create the demo owner and listings once; later runs are no-ops
pub async fn seed_demo_data(db: &SqlitePool) -> Result<()> {
    if users::find_by_email(db, DEMO_OWNER_EMAIL).await?.is_some() {
        info!("Demo data already present");
        return Ok(());
    }

    let owner = users::create(db, None, DEMO_OWNER_EMAIL, UserRole::Owner).await?;
    users::update_profile(
        db,
        &owner.id,
        ProfileUpdate {
            name: Some("Demo Owner".to_string()),
            verification_status: Some(VerificationStatus::Verified),
            ..Default::default()
        },
    )
    .await?;

    let listings = demo_listings(&owner.id);
    let count = listings.len();
    for listing in listings {
        properties::insert(db, listing).await?;
    }

    info!("📋 Seeded {count} demo listings");

    Ok(())
}
