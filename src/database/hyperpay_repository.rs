use crate::database::error::DatabaseError;
use crate::database::repository::HyperPayStore;
use crate::models::{HyperPayTransaction, StatusUpdate};
use async_trait::async_trait;
use sqlx::PgPool;

const HYPERPAY_COLUMNS: &str = "id, checkout_id, order_id, user_id, amount, currency, \
     payment_type, brand, result_code, result_description, status, created_at, updated_at";

/// Postgres-backed store for HyperPay checkouts
pub struct HyperPayRepository {
    pool: PgPool,
}

impl HyperPayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HyperPayStore for HyperPayRepository {
    async fn insert(&self, tx: &HyperPayTransaction) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO hyperpay_transactions
             (id, checkout_id, order_id, user_id, amount, currency, payment_type, brand,
              result_code, result_description, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&tx.id)
        .bind(&tx.checkout_id)
        .bind(&tx.order_id)
        .bind(&tx.user_id)
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(&tx.payment_type)
        .bind(&tx.brand)
        .bind(&tx.result_code)
        .bind(&tx.result_description)
        .bind(&tx.status)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::from_sqlx(e).with_context(format!("checkout_id={}", tx.checkout_id))
        })?;

        Ok(())
    }

    async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<HyperPayTransaction>, DatabaseError> {
        sqlx::query_as::<_, HyperPayTransaction>(&format!(
            "SELECT {} FROM hyperpay_transactions WHERE checkout_id = $1",
            HYPERPAY_COLUMNS
        ))
        .bind(checkout_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update_result(
        &self,
        checkout_id: &str,
        status: &str,
        result_code: Option<&str>,
        result_description: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE hyperpay_transactions
             SET status = $1, result_code = $2, result_description = $3, updated_at = NOW()
             WHERE checkout_id = $4",
        )
        .bind(status)
        .bind(result_code)
        .bind(result_description)
        .bind(checkout_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
