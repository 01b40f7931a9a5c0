//! Request orchestration between handlers, provider adapters and stores

pub mod auth;
pub mod checkout;
pub mod hyperpay;
pub mod shipping;

pub use auth::AuthService;
pub use checkout::CheckoutService;
pub use hyperpay::HyperPayService;
pub use shipping::ShippingService;
