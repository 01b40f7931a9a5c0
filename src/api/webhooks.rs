//! Provider callbacks
//!
//! Both handlers pass the request through untouched; signature checks happen in
//! the gateway before anything is written.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::api::AppState;
use crate::error::AppResult;
use crate::payments::providers::hyperpay::SIGNATURE_HEADER;
use crate::payments::WebhookPayload;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload = WebhookPayload {
        body: body.to_vec(),
        signature: header(&headers, "stripe-signature"),
        params: HashMap::new(),
    };
    state.checkout.handle_webhook(payload).await?;
    Ok(Json(json!({ "status": "processed" })))
}

pub async fn hyperpay(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let payload = WebhookPayload {
        body: Vec::new(),
        signature: header(&headers, SIGNATURE_HEADER),
        params,
    };
    state.hyperpay.handle_webhook(payload).await?;
    Ok(Json(json!({ "status": "received" })))
}
