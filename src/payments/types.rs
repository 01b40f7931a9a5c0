//! Payment provider types and data structures
//!
//! Common types used across all payment providers for requests and responses.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::LineItem;
use crate::reconciliation::NormalizedPaymentResult;

/// Payment request for initiating a checkout
#[derive(Debug, Clone, Default)]
pub struct PaymentRequest {
    /// Amount in major currency units (e.g. riyals)
    pub amount: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Local reference sent to the provider (order id)
    pub reference: Option<String>,
    /// Redirect after a successful hosted checkout
    pub success_url: Option<String>,
    /// Redirect after an abandoned hosted checkout
    pub cancel_url: Option<String>,
    /// HyperPay payment type, `DB` when unset
    pub payment_type: Option<String>,
    /// Card brand the shopper picked (VISA, MASTER, MADA)
    pub brand: Option<String>,
    pub customer: Option<CustomerInfo>,
    pub items: Vec<LineItem>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "givenName", alias = "firstName")]
    pub given_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub surname: Option<String>,
    #[serde(default, alias = "phone")]
    pub mobile: Option<String>,
    #[serde(default, alias = "address")]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// ISO 3166-1 alpha-2
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "postalCode")]
    pub postcode: Option<String>,
}

/// Provider checkout created for a payment request
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSession {
    pub provider_session_id: String,
    /// Hosted checkout page (Stripe)
    pub redirect_url: Option<String>,
    /// Embeddable payment widget script (HyperPay)
    pub widget_url: Option<String>,
    pub result_code: Option<String>,
    pub result_description: Option<String>,
}

/// Provider's current view of a payment
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub result: NormalizedPaymentResult,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub metadata: serde_json::Value,
    /// Provider status fields exactly as received
    pub session_status: Option<String>,
    pub payment_status: Option<String>,
}

/// Inbound webhook request as received over HTTP
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    pub body: Vec<u8>,
    pub signature: Option<String>,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Verified event that should update stored state
    Reconcile {
        reference: String,
        result: NormalizedPaymentResult,
    },
    /// Verified event with nothing to apply
    Ignored { reason: String },
}

/// Converts a major-unit amount to the provider's minor units
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
