use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::database::repository::ShipmentStore;
use crate::error::{AppError, AppResult};
use crate::models::{Carrier, Shipment};
use crate::shipping::types::{RateQuote, RateRequest, ShipmentRequest, ShippingLabel};
use crate::shipping::ShippingCarrier;

#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    pub shipment_id: String,
    pub tracking_number: String,
    pub label: Option<ShippingLabel>,
}

/// Routes shipping calls to the carrier named in the request path
#[derive(Clone)]
pub struct ShippingService {
    dhl: Arc<dyn ShippingCarrier>,
    aramex: Arc<dyn ShippingCarrier>,
    shipments: Arc<dyn ShipmentStore>,
}

impl ShippingService {
    pub fn new(
        dhl: Arc<dyn ShippingCarrier>,
        aramex: Arc<dyn ShippingCarrier>,
        shipments: Arc<dyn ShipmentStore>,
    ) -> Self {
        Self {
            dhl,
            aramex,
            shipments,
        }
    }

    fn carrier(&self, carrier: Carrier) -> &dyn ShippingCarrier {
        match carrier {
            Carrier::Dhl => self.dhl.as_ref(),
            Carrier::Aramex => self.aramex.as_ref(),
        }
    }

    pub async fn rate(&self, carrier: Carrier, request: &RateRequest) -> AppResult<Vec<RateQuote>> {
        request.validate()?;
        self.carrier(carrier).rate(request).await
    }

    /// Books the shipment and records it once, as `created`
    pub async fn create_shipment(
        &self,
        carrier: Carrier,
        request: &ShipmentRequest,
    ) -> AppResult<ShipmentResponse> {
        request.validate()?;
        let confirmation = self.carrier(carrier).create_shipment(request).await?;

        let shipment = Shipment::created(
            carrier,
            confirmation.tracking_number.clone(),
            request.shipper.name.clone(),
            request.recipient.name.clone(),
        );
        self.shipments.insert(&shipment).await?;

        info!(
            "Recorded {} shipment {} (tracking {})",
            carrier.display_name(),
            shipment.id,
            shipment.tracking_number
        );

        Ok(ShipmentResponse {
            shipment_id: shipment.id,
            tracking_number: confirmation.tracking_number,
            label: confirmation.label,
        })
    }

    pub async fn track(&self, carrier: Carrier, tracking_number: &str) -> AppResult<serde_json::Value> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(AppError::validation("Tracking number is required"));
        }
        self.carrier(carrier).track(tracking_number).await
    }
}
