//! In-process record store
//!
//! Implements every store trait over `HashMap`s behind a `tokio` lock. Used by
//! the router tests and for running the service without Postgres.

use crate::database::error::DatabaseError;
use crate::database::repository::{
    HyperPayStore, OrderStore, ShipmentStore, TransactionStore, UserStore,
};
use crate::models::{HyperPayTransaction, Order, PaymentTransaction, Shipment, StatusUpdate, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    transactions: RwLock<HashMap<String, PaymentTransaction>>,
    orders: RwLock<HashMap<String, Order>>,
    hyperpay: RwLock<HashMap<String, HyperPayTransaction>>,
    shipments: RwLock<HashMap<String, Shipment>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), DatabaseError> {
        let mut map = self.transactions.write().await;
        if map.contains_key(&tx.session_id) {
            return Err(DatabaseError::duplicate("session_id", &tx.session_id));
        }
        map.insert(tx.session_id.clone(), tx.clone());
        Ok(())
    }

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DatabaseError> {
        Ok(self.transactions.read().await.get(session_id).cloned())
    }

    async fn update_status(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<bool, DatabaseError> {
        let mut map = self.transactions.write().await;
        match map.get_mut(session_id) {
            Some(tx) => {
                tx.status = update.status.clone();
                tx.payment_status = update.payment_status.clone();
                tx.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), DatabaseError> {
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.session_id.as_deref() == Some(session_id))
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, DatabaseError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.belongs_to(user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn attach_session(
        &self,
        order_id: &str,
        session_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut map = self.orders.write().await;
        match map.get_mut(order_id) {
            Some(order) => {
                order.session_id = Some(session_id.to_string());
                order.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_status_by_session(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<u64, DatabaseError> {
        let mut map = self.orders.write().await;
        let mut updated = 0;
        for order in map
            .values_mut()
            .filter(|o| o.session_id.as_deref() == Some(session_id))
        {
            order.status = update.status.clone();
            order.payment_status = update.payment_status.clone();
            order.updated_at = Utc::now();
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl HyperPayStore for MemoryStore {
    async fn insert(&self, tx: &HyperPayTransaction) -> Result<(), DatabaseError> {
        let mut map = self.hyperpay.write().await;
        if map.contains_key(&tx.checkout_id) {
            return Err(DatabaseError::duplicate("checkout_id", &tx.checkout_id));
        }
        map.insert(tx.checkout_id.clone(), tx.clone());
        Ok(())
    }

    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<HyperPayTransaction>, DatabaseError> {
        Ok(self.hyperpay.read().await.get(checkout_id).cloned())
    }

    async fn update_result(
        &self,
        checkout_id: &str,
        status: &str,
        result_code: Option<&str>,
        result_description: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let mut map = self.hyperpay.write().await;
        match map.get_mut(checkout_id) {
            Some(tx) => {
                tx.status = status.to_string();
                tx.result_code = result_code.map(str::to_string);
                tx.result_description = result_description.map(str::to_string);
                tx.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn insert(&self, shipment: &Shipment) -> Result<(), DatabaseError> {
        self.shipments
            .write()
            .await
            .insert(shipment.tracking_number.clone(), shipment.clone());
        Ok(())
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, DatabaseError> {
        Ok(self.shipments.read().await.get(tracking_number).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let mut map = self.users.write().await;
        if map.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::duplicate("email", &user.email));
        }
        map.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;

    fn order_with_session(session_id: &str) -> Order {
        let item = LineItem {
            product_id: "1".to_string(),
            name: "Tee".to_string(),
            price: 100.0,
            quantity: 1,
            size: None,
            variant_id: None,
            image: None,
        };
        Order::new(None, vec![item], None, None, "sar").with_session(session_id)
    }

    #[tokio::test]
    async fn test_update_unknown_session_reports_no_match() {
        let store = MemoryStore::new();
        let updated = TransactionStore::update_status(
            &store,
            "cs_missing",
            &StatusUpdate::new("completed", "paid"),
        )
        .await
        .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_order_update_by_session_touches_only_matching() {
        let store = MemoryStore::new();
        let a = order_with_session("cs_a");
        let b = order_with_session("cs_b");
        OrderStore::insert(&store, &a).await.unwrap();
        OrderStore::insert(&store, &b).await.unwrap();

        let n = store
            .update_status_by_session("cs_a", &StatusUpdate::new("completed", "paid"))
            .await
            .unwrap();
        assert_eq!(n, 1);

        let a = OrderStore::find_by_id(&store, &a.id).await.unwrap().unwrap();
        let b = OrderStore::find_by_id(&store, &b.id).await.unwrap().unwrap();
        assert_eq!(a.status, "completed");
        assert_eq!(b.status, "pending");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_violation() {
        let store = MemoryStore::new();
        let first = User::new("a@example.com", "A", "hash".to_string());
        let second = User::new("A@example.com", "B", "hash".to_string());
        UserStore::insert(&store, &first).await.unwrap();
        let err = UserStore::insert(&store, &second).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
