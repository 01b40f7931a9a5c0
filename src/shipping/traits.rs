//! Shipping carrier trait definitions

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::Carrier;
use crate::shipping::types::{RateQuote, RateRequest, ShipmentConfirmation, ShipmentRequest};

/// Trait for carrier implementations
///
/// Every call is a single request/response. Implementations must check both
/// the HTTP status and any error flag the carrier embeds in a 200 body.
#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    fn carrier(&self) -> Carrier;

    /// Quote the carrier's products for one package
    async fn rate(&self, request: &RateRequest) -> AppResult<Vec<RateQuote>>;

    /// Book a shipment and return its tracking number and label
    async fn create_shipment(&self, request: &ShipmentRequest) -> AppResult<ShipmentConfirmation>;

    /// Carrier tracking document, passed through unchanged
    async fn track(&self, tracking_number: &str) -> AppResult<serde_json::Value>;
}
