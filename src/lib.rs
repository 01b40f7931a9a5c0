//! Storefront commerce backend
//!
//! Stripe and HyperPay checkout, DHL and Aramex shipping, customer accounts
//! and the reconciliation of provider payment status into local records.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod http_client;
pub mod models;
pub mod payments;
pub mod reconciliation;
pub mod services;
pub mod shipping;
