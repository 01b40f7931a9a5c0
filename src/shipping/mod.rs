//! Shipping carrier integration module
//!
//! DHL Express (MyDHL API) and Aramex behind one [`ShippingCarrier`] trait.

pub mod providers;
pub mod traits;
pub mod types;

pub use traits::ShippingCarrier;
pub use types::{
    Location, Package, Party, RateQuote, RateRequest, ShipmentConfirmation, ShipmentRequest,
    ShippingLabel,
};
