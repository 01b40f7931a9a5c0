//! Carrier implementations

pub mod aramex;
pub mod dhl;

pub use aramex::{AramexCarrier, AramexConfig};
pub use dhl::{DhlCarrier, DhlConfig};
