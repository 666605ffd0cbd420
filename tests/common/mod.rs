#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;
use axum_test::TestServer;
use rambo::{
    config::Config,
    db,
    providers::{LocalFileStore, Mailer, MockPaymentGateway, PaymentGateway},
    state::AppState,
};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:8080";
pub const MAX_UPLOAD_BYTES: usize = 1024;

/// Keeps the last code mailed to each address
#[derive(Default)]
pub struct RecordingMailer {
    codes: Mutex<HashMap<String, String>>,
}

impl RecordingMailer {
    pub fn code_for(&self, email: &str) -> String {
        self.codes.lock().unwrap().get(email).cloned().unwrap()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

pub struct Account {
    pub id: String,
    pub token: String,
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    _uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_payments(Arc::new(MockPaymentGateway)).await
    }

    pub async fn with_payments(payments: Arc<dyn PaymentGateway>) -> Self {
        let uploads = tempfile::tempdir().unwrap();

        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            upload_dir: uploads.path().to_path_buf(),
            public_base_url: BASE_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            ..Default::default()
        };

        let pool = db::connect(&config.database_url).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let files = Arc::new(LocalFileStore::new(uploads.path(), BASE_URL));

        let state = AppState::with_providers(
            config,
            pool,
            mailer.clone(),
            payments,
            files,
        );

        let server = TestServer::new(rambo::app(state.clone())).unwrap();

        Self {
            server,
            state,
            mailer,
            _uploads: uploads,
        }
    }

    /// Run the emailed-code flow and return the session token
    pub async fn sign_in(&self, email: &str) -> Account {
        self.server
            .post("/api/auth/send-otp")
            .json(&json!({ "email": email }))
            .await
            .assert_status_ok();

        let code = self.mailer.code_for(&email.to_lowercase());

        let response = self
            .server
            .post("/api/auth/verify-otp")
            .json(&json!({ "email": email, "code": code }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        Account {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: response.cookie("session").value().to_string(),
        }
    }

    pub async fn sign_in_owner(&self, email: &str) -> Account {
        let account = self.sign_in(email).await;

        self.server
            .post("/api/auth/signup")
            .authorization_bearer(&account.token)
            .json(&json!({ "email": email, "name": "Olive Owner", "role": "OWNER" }))
            .await
            .assert_status_ok();

        account
    }

    pub async fn create_property(&self, owner: &Account, category: &str, property_type: &str) -> String {
        let response = self
            .server
            .post("/api/property")
            .authorization_bearer(&owner.token)
            .json(&listing(category, property_type))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        response.json::<Value>()["property"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn listing(category: &str, property_type: &str) -> Value {
    json!({
        "title": "Craftsman bungalow",
        "description": "Porch, garden and a short walk to the park",
        "type": property_type,
        "category": category,
        "price": 2300.0,
        "address": "5 Elm St",
        "city": "Austin",
        "state": "TX",
        "bedrooms": 3,
        "bathrooms": 2,
        "area": 1400.0,
        "amenities": ["Garden"],
        "images": ["https://images.example.com/bungalow.jpg"]
    })
}
