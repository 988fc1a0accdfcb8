//! Cart route handlers.
//!
//! Every mutation answers with the whole cart so the client can re-render
//! totals without a second request.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{debug, instrument};

use cradlix_core::{ProductId, UserId};

use crate::db::{CartRepository, CatalogRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::cart::{MAX_LINE_QUANTITY, check_quantity};
use crate::models::Cart;
use crate::routes::or_not_found;
use crate::services::checkout::Pricing;
use crate::state::AppState;

/// `POST /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// `PATCH /api/cart/items/{product_id}` body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// The cart with shipping and totals.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>, AppError> {
    load_cart(&state, user.id).await.map(Json)
}

/// Add a product, merging with an existing line.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<Json<Cart>, AppError> {
    let quantity = check_quantity(req.quantity)?;
    let limit = line_limit(&state, req.product_id).await?;

    let merged = CartRepository::new(state.pool())
        .add(user.id, req.product_id, quantity, limit)
        .await?
        .ok_or_else(|| limit_exceeded(limit))?;
    debug!(quantity = merged, "Cart line updated");

    load_cart(&state, user.id).await.map(Json)
}

/// Set a line's quantity.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> Result<Json<Cart>, AppError> {
    let quantity = check_quantity(req.quantity)?;
    let limit = line_limit(&state, product_id).await?;
    if quantity > limit {
        return Err(limit_exceeded(limit));
    }

    CartRepository::new(state.pool())
        .set_quantity(user.id, product_id, quantity)
        .await
        .map_err(or_not_found("Cart item"))?;

    load_cart(&state, user.id).await.map(Json)
}

/// Remove a line.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Cart>, AppError> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await
        .map_err(or_not_found("Cart item"))?;

    load_cart(&state, user.id).await.map(Json)
}

/// Empty the cart.
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>, AppError> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    load_cart(&state, user.id).await.map(Json)
}

async fn load_cart(state: &AppState, user_id: UserId) -> Result<Cart, AppError> {
    let lines = CartRepository::new(state.pool()).lines(user_id).await?;
    Ok(Cart::new(lines, &Pricing::from(state.config().checkout)))
}

/// Highest quantity one line of this product may hold right now.
async fn line_limit(state: &AppState, product_id: ProductId) -> Result<i32, AppError> {
    let stock = CatalogRepository::new(state.pool())
        .active_stock(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if stock <= 0 {
        return Err(AppError::BadRequest("This product is out of stock".to_string()));
    }
    Ok(stock.min(MAX_LINE_QUANTITY))
}

fn limit_exceeded(limit: i32) -> AppError {
    AppError::BadRequest(format!("You can have at most {limit} of this product in your cart"))
}
