//! Brand management.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use cradlix_core::BrandId;

use crate::db::BrandRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Brand, BrandInput, BrandRequest};
use crate::routes::or_not_found;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Brand>>, AppError> {
    let brands = BrandRepository::new(state.pool()).list().await?;
    Ok(Json(brands))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<BrandId>,
) -> Result<Json<Brand>, AppError> {
    let brand = BrandRepository::new(state.pool())
        .get(id)
        .await
        .map_err(or_not_found("Brand"))?;
    Ok(Json(brand))
}

/// Create a brand; the slug comes from the name when not given.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<BrandRequest>,
) -> Result<(StatusCode, Json<Brand>), AppError> {
    let input = BrandInput::try_from(req)?;
    let brand = BrandRepository::new(state.pool()).create(&input).await?;
    info!(brand_id = %brand.id, slug = %brand.slug, "Brand created");
    Ok((StatusCode::CREATED, Json(brand)))
}

#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<BrandId>,
    ApiJson(req): ApiJson<BrandRequest>,
) -> Result<Json<Brand>, AppError> {
    let input = BrandInput::try_from(req)?;
    let brand = BrandRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Brand"))?;
    info!(slug = %brand.slug, "Brand updated");
    Ok(Json(brand))
}

/// Delete a brand, leaving its products unbranded.
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<BrandId>,
) -> Result<StatusCode, AppError> {
    let detached = BrandRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Brand"))?;
    info!(detached_products = detached, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}
