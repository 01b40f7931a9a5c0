//! Record store contracts
//!
//! Each record type has its own store trait. Updates are expressed as
//! "set these fields where key = value" so that concurrent writers never
//! read-modify-write a whole record; the last write wins.

use crate::database::error::DatabaseError;
use crate::models::{HyperPayTransaction, Order, PaymentTransaction, Shipment, StatusUpdate, User};
use async_trait::async_trait;

/// Stripe checkout session records, keyed by provider session id
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), DatabaseError>;

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DatabaseError>;

    /// Returns `false` when no record carries `session_id`
    async fn update_status(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError>;

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DatabaseError>;

    /// Newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, DatabaseError>;

    /// Links an order to a provider session or checkout id
    async fn attach_session(&self, order_id: &str, session_id: &str)
        -> Result<bool, DatabaseError>;

    /// Returns the number of orders updated
    async fn update_status_by_session(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait HyperPayStore: Send + Sync {
    async fn insert(&self, tx: &HyperPayTransaction) -> Result<(), DatabaseError>;

    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<HyperPayTransaction>, DatabaseError>;

    /// Stores the latest provider result for a checkout
    async fn update_result(
        &self,
        checkout_id: &str,
        status: &str,
        result_code: Option<&str>,
        result_description: Option<&str>,
    ) -> Result<bool, DatabaseError>;
}

/// Shipments are written once and never updated
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn insert(&self, shipment: &Shipment) -> Result<(), DatabaseError>;

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with a constraint violation when the email is taken
    async fn insert(&self, user: &User) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}
