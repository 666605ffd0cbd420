use serde::Serialize;

/// What a payment gateway needs to charge for a booking
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub booking_id: String,
    pub customer_id: String,
    /// Amount in the listing currency
    pub amount: f64,
    pub method: String,
    pub description: String,
}

/// Location of a file after upload
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}
