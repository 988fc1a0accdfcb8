//! Order history route handlers.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use cradlix_core::{OrderId, UserId};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderSummary, Page};
use crate::routes::PageParams;
use crate::state::AppState;

const ORDERS_PER_PAGE: u32 = 10;

/// The customer's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<OrderSummary>>, AppError> {
    let (page, limit, offset) = params.window(ORDERS_PER_PAGE)?;
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_user(user.id, limit, offset)
        .await?;
    Ok(Json(Page::new(orders, page, ORDERS_PER_PAGE, total)))
}

/// One order with items and shipping address.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    find(&state, user.id, id).await.map(Json)
}

/// Cancel an order that has not been paid, or a COD order that has not shipped.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = find(&state, user.id, id).await?;
    let cancelled = OrderRepository::new(state.pool())
        .cancel(order.id, order.customer_cancellable())
        .await?;
    info!(previous = %order.status, "Order cancelled by customer");
    Ok(Json(cancelled))
}

async fn find(
    state: &AppState,
    user_id: UserId,
    id: OrderId,
) -> Result<Order, AppError> {
    OrderRepository::new(state.pool())
        .get_for_user(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
