use crate::database::error::DatabaseError;
use crate::database::repository::ShipmentStore;
use crate::models::Shipment;
use async_trait::async_trait;
use sqlx::PgPool;

/// Shipment Repository; rows are insert-only
pub struct ShipmentRepository {
    pool: PgPool,
}

impl ShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShipmentStore for ShipmentRepository {
    async fn insert(&self, shipment: &Shipment) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO shipments
             (id, carrier, tracking_number, shipper_name, recipient_name, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&shipment.id)
        .bind(&shipment.carrier)
        .bind(&shipment.tracking_number)
        .bind(&shipment.shipper_name)
        .bind(&shipment.recipient_name)
        .bind(&shipment.status)
        .bind(shipment.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, DatabaseError> {
        sqlx::query_as::<_, Shipment>(
            "SELECT id, carrier, tracking_number, shipper_name, recipient_name, status, created_at
             FROM shipments WHERE tracking_number = $1",
        )
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
