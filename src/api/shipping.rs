use axum::extract::{Path, State};
use axum::Json;

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::Carrier;
use crate::services::shipping::ShipmentResponse;
use crate::shipping::{RateQuote, RateRequest, ShipmentRequest};

pub async fn rates(
    State(state): State<AppState>,
    Path(carrier): Path<String>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<Vec<RateQuote>>> {
    let carrier: Carrier = carrier.parse()?;
    Ok(Json(state.shipping.rate(carrier, &request).await?))
}

pub async fn create_shipment(
    State(state): State<AppState>,
    Path(carrier): Path<String>,
    Json(request): Json<ShipmentRequest>,
) -> AppResult<Json<ShipmentResponse>> {
    let carrier: Carrier = carrier.parse()?;
    Ok(Json(state.shipping.create_shipment(carrier, &request).await?))
}

pub async fn track(
    State(state): State<AppState>,
    Path((carrier, tracking_number)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let carrier: Carrier = carrier.parse()?;
    Ok(Json(state.shipping.track(carrier, &tracking_number).await?))
}
