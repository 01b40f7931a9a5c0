use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// Stripe checkout session as recorded locally
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentTransaction {
    pub id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    /// Cart snapshot taken when the session was created
    pub items: Json<serde_json::Value>,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn new(
        session_id: impl Into<String>,
        user_id: Option<String>,
        amount: f64,
        currency: &str,
        items: serde_json::Value,
    ) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            session_id: session_id.into(),
            user_id,
            amount,
            currency: currency.to_string(),
            items: Json(items),
            status: "pending".to_string(),
            payment_status: "initiated".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// HyperPay checkout, kept apart from Stripe sessions
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HyperPayTransaction {
    pub id: String,
    pub checkout_id: String,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub payment_type: String,
    pub brand: Option<String>,
    pub result_code: Option<String>,
    pub result_description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HyperPayTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        checkout_id: impl Into<String>,
        order_id: Option<String>,
        user_id: Option<String>,
        amount: f64,
        currency: &str,
        payment_type: &str,
        brand: Option<String>,
        result_code: Option<String>,
        result_description: Option<String>,
    ) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            checkout_id: checkout_id.into(),
            order_id,
            user_id,
            amount,
            currency: currency.to_string(),
            payment_type: payment_type.to_string(),
            brand,
            result_code,
            result_description,
            status: "pending".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field values written by a status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: String,
    pub payment_status: String,
}

impl StatusUpdate {
    pub fn new(status: impl Into<String>, payment_status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            payment_status: payment_status.into(),
        }
    }
}
