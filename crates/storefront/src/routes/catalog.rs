//! Catalog route handlers.
//!
//! Categories and brands change rarely and are served from the in-memory
//! cache; product queries always hit the database.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::header::CACHE_CONTROL,
    response::IntoResponse,
};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{
    Brand, Category, Page, ProductDetail, ProductListParams, ProductQuery, ProductSummary,
};
use crate::routes::PUBLIC_CACHE_CONTROL;
use crate::state::AppState;

/// All categories.
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories: Arc<Vec<Category>> = state.cache().categories(state.pool()).await?;
    Ok(([(CACHE_CONTROL, PUBLIC_CACHE_CONTROL)], Json(categories)))
}

/// All brands.
pub async fn brands(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let brands: Arc<Vec<Brand>> = state.cache().brands(state.pool()).await?;
    Ok(([(CACHE_CONTROL, PUBLIC_CACHE_CONTROL)], Json(brands)))
}

/// Filtered, sorted, paginated product listing.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Page<ProductSummary>>, AppError> {
    let query = ProductQuery::try_from(params)?;
    let (items, total) = CatalogRepository::new(state.pool())
        .list_products(&query)
        .await?;
    Ok(Json(Page::new(items, query.page, query.per_page, total)))
}

/// Product detail page data.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ProductDetail>, AppError> {
    CatalogRepository::new(state.pool())
        .product_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
