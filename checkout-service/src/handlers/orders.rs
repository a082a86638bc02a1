use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::{CreateOrderRequest, CreateOrderResponse, OrderSummary};
use crate::middleware::UserId;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Open a gateway order for the cart and record it as `Pending`.
///
/// POST /order/create
#[tracing::instrument(
    skip(state, payload),
    fields(user_id = %payload.user_id, amount = payload.amount, items = payload.items.len())
)]
pub async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let order = state.orders.create_order(payload).await?;

    Ok(Json(CreateOrderResponse {
        order_id: order.id,
        gateway_order_id: order.gateway_order_id,
        amount: order.total_amount,
        currency: order.currency,
        key_id: state.orders.key_id().to_string(),
    }))
}

/// The caller's orders, newest first.
///
/// GET /orders
#[tracing::instrument(skip(state, user), fields(user_id = %user.as_str()))]
pub async fn list_orders(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let orders = state.orders.orders_for_user(user.as_str()).await?;
    Ok(Json(orders.into_iter().map(OrderSummary::from).collect()))
}
