//! Payment provider integration module
//!
//! This module provides a unified interface for the storefront's payment
//! providers: Stripe hosted checkout and the HyperPay payment widget.

pub mod providers;
pub mod traits;
pub mod types;

pub use traits::PaymentGateway;
pub use types::{PaymentRequest, PaymentSession, StatusReport, WebhookOutcome, WebhookPayload};
