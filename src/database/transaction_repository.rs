use crate::database::error::DatabaseError;
use crate::database::repository::TransactionStore;
use crate::models::{PaymentTransaction, StatusUpdate};
use async_trait::async_trait;
use sqlx::PgPool;

const PAYMENT_COLUMNS: &str = "id, session_id, user_id, amount, currency, items, status, \
     payment_status, created_at, updated_at";

/// Postgres-backed store for Stripe checkout sessions
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO payment_transactions
             (id, session_id, user_id, amount, currency, items, status, payment_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&tx.id)
        .bind(&tx.session_id)
        .bind(&tx.user_id)
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(&tx.items)
        .bind(&tx.status)
        .bind(&tx.payment_status)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::from_sqlx(e).with_context(format!("session_id={}", tx.session_id))
        })?;

        Ok(())
    }

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, DatabaseError> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {} FROM payment_transactions WHERE session_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update_status(
        &self,
        session_id: &str,
        update: &StatusUpdate,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE payment_transactions
             SET status = $1, payment_status = $2, updated_at = NOW()
             WHERE session_id = $3",
        )
        .bind(&update.status)
        .bind(&update.payment_status)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
