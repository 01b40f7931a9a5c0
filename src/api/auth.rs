use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::extract::AuthUser;
use crate::api::AppState;
use crate::error::AppResult;
use crate::models::PublicUser;
use crate::services::auth::{AuthResponse, LoginRequest, RegisterRequest};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth.login(request).await?))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<PublicUser>> {
    Ok(Json(state.auth.current_user(&user.id).await?))
}
