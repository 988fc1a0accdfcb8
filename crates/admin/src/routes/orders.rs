//! Order management.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use cradlix_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{Order, OrderFilter, OrderSummary, Page, StatusUpdate};
use crate::routes::{PageParams, or_not_found};
use crate::state::AppState;

const ORDERS_PER_PAGE: u32 = 20;

/// Orders, newest first, optionally filtered by status.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<Json<Page<OrderSummary>>, AppError> {
    let (page, limit, offset) = PageParams { page: filter.page }.window(ORDERS_PER_PAGE)?;
    let (orders, total) = OrderRepository::new(state.pool())
        .list(filter.status, limit, offset)
        .await?;
    Ok(Json(Page::new(orders, page, ORDERS_PER_PAGE, total)))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await
        .map_err(or_not_found("Order"))?;
    Ok(Json(order))
}

/// Move an order along its lifecycle.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id, next = %update.status))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .set_status(id, update.status)
        .await
        .map_err(or_not_found("Order"))?;
    info!("Order status changed");
    Ok(Json(order))
}
