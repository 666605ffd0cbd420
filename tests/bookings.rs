mod common;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use common::{Account, TestApp};
use rambo::{
    db::revenues,
    providers::{MockPaymentGateway, PaymentGateway, PaymentRequest},
};
use serde_json::{Value, json};

/// Holds every charge open long enough for a second request to overlap it
struct SlowGateway;

#[async_trait]
impl PaymentGateway for SlowGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<String> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        MockPaymentGateway.charge(request).await
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }
}

struct Deal {
    owner: Account,
    customer: Account,
    property_id: String,
}

async fn deal(app: &TestApp, category: &str, property_type: &str) -> Deal {
    let owner = app.sign_in_owner("owner@example.com").await;
    let customer = app.sign_in("buyer@example.com").await;
    let property_id = app.create_property(&owner, category, property_type).await;

    Deal {
        owner,
        customer,
        property_id,
    }
}

async fn book(app: &TestApp, deal: &Deal, booking_type: &str) -> Value {
    let response = app
        .server
        .post("/api/booking/create")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({
            "propertyId": deal.property_id,
            "type": booking_type,
            "meetingDate": "2026-11-02T16:00:00Z",
            "meetingLocation": "On site"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json::<Value>()["booking"].clone()
}

#[tokio::test]
async fn rent_bookings_await_payment() {
    let app = TestApp::new().await;
    let deal = deal(&app, "RENT", "APARTMENT").await;

    let booking = book(&app, &deal, "RENT").await;
    assert_eq!(booking["status"], "PENDING");
    assert_eq!(booking["paymentStatus"], "PENDING");
    assert_eq!(booking["customerId"], deal.customer.id.as_str());
    assert_eq!(booking["ownerId"], deal.owner.id.as_str());
    assert_eq!(booking["meetingDate"], "2026-11-02T16:00:00Z");
}

#[tokio::test]
async fn buy_bookings_skip_payment() {
    let app = TestApp::new().await;
    let deal = deal(&app, "BUY", "HOUSE").await;

    let booking = book(&app, &deal, "BUY").await;
    assert!(booking["paymentStatus"].is_null());

    let response = app
        .server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({ "bookingId": booking["id"], "amount": 1000.0, "paymentMethod": "card" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Payment only available for rent bookings"
    );
}

#[tokio::test]
async fn booking_rules() {
    let app = TestApp::new().await;
    let deal = deal(&app, "RENT", "ROOM").await;

    let own = app
        .server
        .post("/api/booking/create")
        .authorization_bearer(&deal.owner.token)
        .json(&json!({ "propertyId": deal.property_id, "type": "RENT" }))
        .await;
    own.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(own.json::<Value>()["error"], "Cannot book your own property");

    app.server
        .post("/api/booking/create")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({ "propertyId": "missing", "type": "RENT" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/booking/create")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({ "propertyId": deal.property_id, "type": "RENT", "meetingDate": "soon" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_confirms_booking_and_records_revenue() {
    let app = TestApp::new().await;
    let deal = deal(&app, "RENT", "HOUSE").await;
    let booking = book(&app, &deal, "RENT").await;
    let payment = json!({ "bookingId": booking["id"], "amount": 2300.0, "paymentMethod": "card" });

    app.server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.owner.token)
        .json(&payment)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({ "bookingId": booking["id"], "amount": 0, "paymentMethod": "card" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.customer.token)
        .json(&payment)
        .await;
    response.assert_status_ok();

    let paid = &response.json::<Value>()["booking"];
    assert_eq!(paid["status"], "CONFIRMED");
    assert_eq!(paid["paymentStatus"], "PAID");
    assert_eq!(paid["paymentAmount"], 2300.0);
    assert!(paid["paymentIntentId"].as_str().unwrap().starts_with("pi_"));

    let again = app
        .server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.customer.token)
        .json(&payment)
        .await;
    again.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(again.json::<Value>()["error"], "Booking already paid");

    let report: Value = app
        .server
        .get("/api/dashboard/revenue")
        .authorization_bearer(&deal.owner.token)
        .await
        .json();
    assert_eq!(report["totalRevenue"], 2300.0);
    assert_eq!(report["bookings"]["confirmed"], 1);
    assert_eq!(report["buckets"].as_array().unwrap().len(), 1);
    assert_eq!(report["period"], "monthly");

    let weekly: Value = app
        .server
        .get("/api/dashboard/revenue")
        .add_query_param("period", "weekly")
        .authorization_bearer(&deal.owner.token)
        .await
        .json();
    assert!(weekly["buckets"][0]["period"].as_str().unwrap().contains("-W"));

    app.server
        .get("/api/dashboard/revenue")
        .authorization_bearer(&deal.customer.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn completion_and_ratings() {
    let app = TestApp::new().await;
    let deal = deal(&app, "RENT", "VILLA").await;
    let stranger = app.sign_in("stranger@example.com").await;
    let booking = book(&app, &deal, "RENT").await;
    let id = booking["id"].as_str().unwrap().to_string();

    let rate = |rated_id: &str, rating: i64| {
        json!({ "bookingId": id, "ratedId": rated_id, "rating": rating, "comment": "Lovely stay" })
    };

    let early = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(deal.owner.id.as_str(), 5))
        .await;
    early.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(early.json::<Value>()["error"], "Can only rate completed bookings");

    app.server
        .patch(&format!("/api/booking/{id}/complete"))
        .authorization_bearer(&stranger.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let completed = app
        .server
        .patch(&format!("/api/booking/{id}/complete"))
        .authorization_bearer(&deal.customer.token)
        .await;
    completed.assert_status_ok();
    let completed = completed.json::<Value>();
    assert_eq!(completed["booking"]["status"], "COMPLETED");
    assert!(completed["booking"]["completedAt"].is_string());

    let out_of_range = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(deal.owner.id.as_str(), 6))
        .await;
    out_of_range.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(out_of_range.json::<Value>()["error"], "Rating must be between 1 and 5");

    let self_rating = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(deal.customer.id.as_str(), 5))
        .await;
    self_rating.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(self_rating.json::<Value>()["error"], "Cannot rate yourself");

    let outsider = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(stranger.id.as_str(), 5))
        .await;
    outsider.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(outsider.json::<Value>()["error"], "Invalid user to rate");

    app.server
        .post("/api/rating/create")
        .authorization_bearer(&stranger.token)
        .json(&rate(deal.owner.id.as_str(), 1))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let rated = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(deal.owner.id.as_str(), 5))
        .await;
    rated.assert_status(StatusCode::CREATED);
    assert_eq!(rated.json::<Value>()["rating"]["rating"], 5);

    let duplicate = app
        .server
        .post("/api/rating/create")
        .authorization_bearer(&deal.customer.token)
        .json(&rate(deal.owner.id.as_str(), 4))
        .await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.json::<Value>()["error"], "Rating already submitted");

    let mine: Value = app
        .server
        .get("/api/booking/my-bookings")
        .authorization_bearer(&deal.customer.token)
        .await
        .json();
    let mine = mine["bookings"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["property"]["id"], deal.property_id.as_str());
    assert_eq!(mine[0]["owner"]["id"], deal.owner.id.as_str());
    assert_eq!(mine[0]["ratings"].as_array().unwrap().len(), 1);

    // The owner sees the same booking but has not rated yet
    let theirs: Value = app
        .server
        .get("/api/booking/my-bookings")
        .authorization_bearer(&deal.owner.token)
        .await
        .json();
    let theirs = theirs["bookings"].as_array().unwrap();
    assert_eq!(theirs.len(), 1);
    assert!(theirs[0]["ratings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn overlapping_payments_settle_once() {
    let app = TestApp::with_payments(Arc::new(SlowGateway)).await;
    let deal = deal(&app, "RENT", "APARTMENT").await;
    let booking = book(&app, &deal, "RENT").await;
    let payment = json!({ "bookingId": booking["id"], "amount": 1800.0, "paymentMethod": "card" });

    let pay = || {
        app.server
            .post("/api/booking/payment")
            .authorization_bearer(&deal.customer.token)
            .json(&payment)
    };
    let (first, second) = tokio::join!(async { pay().await }, async { pay().await });

    let mut statuses = [first.status_code(), second.status_code()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);

    let rejected = if first.status_code() == StatusCode::OK { second } else { first };
    assert_eq!(rejected.json::<Value>()["error"], "Booking already paid");

    let recorded = revenues::list_for_owner(&app.state.db, &deal.owner.id).await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].amount, 1800.0);
}

#[tokio::test]
async fn completed_bookings_cannot_be_paid() {
    let app = TestApp::new().await;
    let deal = deal(&app, "RENT", "ROOM").await;
    let booking = book(&app, &deal, "RENT").await;
    let id = booking["id"].as_str().unwrap().to_string();

    app.server
        .patch(&format!("/api/booking/{id}/complete"))
        .authorization_bearer(&deal.customer.token)
        .await
        .assert_status_ok();

    let response = app
        .server
        .post("/api/booking/payment")
        .authorization_bearer(&deal.customer.token)
        .json(&json!({ "bookingId": id, "amount": 900.0, "paymentMethod": "card" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Only pending or confirmed bookings can be paid"
    );

    // Still completed, so it can be rated
    let mine: Value = app
        .server
        .get("/api/booking/my-bookings")
        .authorization_bearer(&deal.customer.token)
        .await
        .json();
    assert_eq!(mine["bookings"][0]["status"], "COMPLETED");
    assert_eq!(mine["bookings"][0]["paymentStatus"], "PENDING");
}
