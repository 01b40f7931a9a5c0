use axum::extract::{Path, State};
use axum::Json;

use crate::api::extract::OptionalUser;
use crate::api::AppState;
use crate::error::AppResult;
use crate::services::hyperpay::{HyperPayStatusResponse, InitiateRequest, InitiateResponse};

pub async fn initiate(
    State(state): State<AppState>,
    user: OptionalUser,
    Json(request): Json<InitiateRequest>,
) -> AppResult<Json<InitiateResponse>> {
    Ok(Json(state.hyperpay.initiate(request, user.id()).await?))
}

pub async fn status(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
) -> AppResult<Json<HyperPayStatusResponse>> {
    Ok(Json(state.hyperpay.status(&checkout_id).await?))
}
