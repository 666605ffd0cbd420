use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::Mailer;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const OTP_SUBJECT: &str = "Your Rambo Verification Code";

/// Development mailer: writes the code to the log instead of sending it
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()> {
        info!(email, "[DEV] OTP for {email}: {code}");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}

/// Sends codes through the Resend HTTP API
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, from, RESEND_ENDPOINT)
    }

    /// Point at a different API base, e.g. a local stub
    pub fn with_endpoint(
        api_key: impl Into<String>,
        from: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            from: from.into(),
            endpoint: endpoint.into(),
        })
    }

    fn body(&self, email: &str, code: &str) -> serde_json::Value {
        json!({
            "from": self.from,
            "to": [email],
            "subject": OTP_SUBJECT,
            "html": format!("<p>Your verification code is: <strong>{code}</strong></p>"),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()> {
        debug!(email, "Sending OTP through Resend");

        self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(email, code))
            .send()
            .await
            .context("Failed to reach email provider")?
            .error_for_status()
            .context("Email provider rejected the message")?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "resend"
    }
}
