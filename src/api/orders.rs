use axum::extract::{Path, State};
use axum::Json;

use crate::api::extract::AuthUser;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::Order;

/// Caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.stores.orders.list_by_user(&user.id).await?))
}

/// Someone else's order is reported as missing
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<Order>> {
    match state.stores.orders.find_by_id(&order_id).await? {
        Some(order) if order.belongs_to(&user.id) => Ok(Json(order)),
        _ => Err(AppError::not_found("Order", order_id)),
    }
}
