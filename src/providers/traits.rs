use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;

use super::types::{PaymentRequest, StoredFile};

/// Delivers one-time codes to users.
/// Lets the dev log mailer and real providers (Resend, SendGrid) swap freely.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()>;

    /// Get the name of the delivery provider
    fn provider_name(&self) -> &'static str;
}

/// Charges a customer and hands back the processor's payment intent id
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &PaymentRequest) -> Result<String>;

    fn provider_name(&self) -> &'static str;
}

/// Persists uploaded chat attachments and tells where they can be fetched
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, file_name: &str, content_type: &str, bytes: Bytes) -> Result<StoredFile>;

    fn provider_name(&self) -> &'static str;
}
