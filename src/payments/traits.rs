//! Payment gateway trait definitions
//!
//! Defines the common interface that all payment providers must implement.

use crate::error::AppResult;
use crate::payments::types::{PaymentRequest, PaymentSession, StatusReport, WebhookOutcome, WebhookPayload};
use crate::reconciliation::PaymentProviderKind;
use async_trait::async_trait;

/// Trait for payment provider implementations
///
/// Stripe and HyperPay implement this trait so checkout, polling and webhook
/// handling share one shape. Implementations never retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProviderKind;

    /// Create a checkout with the provider
    ///
    /// # Returns
    /// * `PaymentSession` - Provider checkout id plus the redirect or widget URL
    async fn initiate(&self, request: PaymentRequest) -> AppResult<PaymentSession>;

    /// Read the provider's current status for a checkout
    ///
    /// # Arguments
    /// * `reference` - Provider session or checkout id returned from `initiate`
    /// * `brand` - Card brand used at initiation, if the provider needs it
    async fn query_status(&self, reference: &str, brand: Option<&str>) -> AppResult<StatusReport>;

    /// Verify and interpret a webhook delivery
    ///
    /// Returns an `InvalidWebhook` error when authentication fails. Nothing may
    /// be written to the stores before this succeeds.
    fn handle_webhook(&self, payload: &WebhookPayload) -> AppResult<WebhookOutcome>;
}
