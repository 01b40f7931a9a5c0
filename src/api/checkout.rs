use axum::extract::{Path, State};
use axum::Json;

use crate::api::extract::OptionalUser;
use crate::api::AppState;
use crate::error::AppResult;
use crate::services::checkout::{CheckoutRequest, CheckoutSessionResponse, CheckoutStatusResponse};

pub async fn create_session(
    State(state): State<AppState>,
    user: OptionalUser,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutSessionResponse>> {
    Ok(Json(state.checkout.create_session(request, user.id()).await?))
}

pub async fn status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<CheckoutStatusResponse>> {
    Ok(Json(state.checkout.status(&session_id).await?))
}
