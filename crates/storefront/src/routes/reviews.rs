//! Product review route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use cradlix_core::ProductId;

use crate::db::{CatalogRepository, ReviewRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::{Page, Review, ReviewInput, ReviewRequest};
use crate::routes::PageParams;
use crate::state::AppState;

const REVIEWS_PER_PAGE: u32 = 10;

/// A page of reviews, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Review>>, AppError> {
    let (page, limit, offset) = params.window(REVIEWS_PER_PAGE)?;
    let product_id = active_product(&state, &slug).await?;

    let (reviews, total) = ReviewRepository::new(state.pool())
        .list(product_id, limit, offset)
        .await?;
    Ok(Json(Page::new(reviews, page, REVIEWS_PER_PAGE, total)))
}

/// Review a product. One review per customer per product.
#[instrument(skip_all, fields(user_id = %user.id, slug = %slug))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(slug): ApiPath<String>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let input = ReviewInput::try_from(req)?;
    let product_id = active_product(&state, &slug).await?;

    let review = ReviewRepository::new(state.pool())
        .create(product_id, user.id, &input)
        .await?;
    info!(review_id = %review.id, rating = review.rating.get(), "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

async fn active_product(state: &AppState, slug: &str) -> Result<ProductId, AppError> {
    CatalogRepository::new(state.pool())
        .active_product_id(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
