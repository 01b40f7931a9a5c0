use crate::database::error::DatabaseError;
use crate::database::repository::OrderStore;
use crate::models::{Order, StatusUpdate};
use async_trait::async_trait;
use sqlx::PgPool;

const ORDER_COLUMNS: &str = "id, user_id, session_id, items, shipping_address, discount_code, \
     subtotal, tax, shipping, total, currency, status, payment_status, created_at, updated_at";

/// Order Repository for order-specific operations
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO orders
             (id, user_id, session_id, items, shipping_address, discount_code, subtotal, tax,
              shipping, total, currency, status, payment_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.session_id)
        .bind(&order.items)
        .bind(&order.shipping_address)
        .bind(&order.discount_code)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.shipping)
        .bind(order.total)
        .bind(&order.currency)
        .bind(&order.status)
        .bind(&order.payment_status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e).with_context(format!("order_id={}", order.id)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE session_id = $1 ORDER BY created_at DESC LIMIT 1",
            ORDER_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn attach_session(
        &self,
        order_id: &str,
        session_id: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders SET session_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(session_id)
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status_by_session(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $1, payment_status = $2, updated_at = NOW()
             WHERE session_id = $3",
        )
        .bind(&update.status)
        .bind(&update.payment_status)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected())
    }
}
