//! Persisted records and the value types they carry

pub mod order;
pub mod shipment;
pub mod transaction;
pub mod user;

pub use order::{round2, validate_items, LineItem, Order, OrderTotals, ShippingAddress, VAT_RATE};
pub use shipment::{Carrier, Shipment};
pub use transaction::{HyperPayTransaction, PaymentTransaction, StatusUpdate};
pub use user::{PublicUser, User};

use chrono::{DateTime, Utc};

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
