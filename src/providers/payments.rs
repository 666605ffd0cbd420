use anyhow::{Result, ensure};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::{traits::PaymentGateway, types::PaymentRequest};

/// Stand-in until a card processor is wired up: every charge succeeds
#[derive(Debug, Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<String> {
        ensure!(request.amount > 0.0, "payment amount must be positive");

        let intent_id = format!("pi_{}", Utc::now().timestamp_millis());
        info!(
            booking_id = %request.booking_id,
            amount = request.amount,
            method = %request.method,
            "Simulated payment {intent_id}"
        );

        Ok(intent_id)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: f64) -> PaymentRequest {
        PaymentRequest {
            booking_id: "b1".to_string(),
            customer_id: "c1".to_string(),
            amount,
            method: "card".to_string(),
            description: "Rent payment".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_charges_produce_intent_ids() {
        let intent = MockPaymentGateway.charge(&request(1200.0)).await.unwrap();
        assert!(intent.starts_with("pi_"));
        assert!(intent[3..].parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn mock_rejects_non_positive_amounts() {
        assert!(MockPaymentGateway.charge(&request(0.0)).await.is_err());
    }
}
