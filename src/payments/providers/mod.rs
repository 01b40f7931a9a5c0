//! Payment provider implementations
//!
//! Concrete implementations of the PaymentGateway trait for different providers.

pub mod hyperpay;
pub mod stripe;

pub use hyperpay::{HyperPayConfig, HyperPayGateway};
pub use stripe::{StripeConfig, StripeGateway};
