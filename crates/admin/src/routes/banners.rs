//! Home page banner management.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use cradlix_core::BannerId;

use crate::db::BannerRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Banner, BannerInput, BannerRequest};
use crate::routes::or_not_found;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Banner>>, AppError> {
    let banners = BannerRepository::new(state.pool()).list().await?;
    Ok(Json(banners))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<BannerId>,
) -> Result<Json<Banner>, AppError> {
    let banner = BannerRepository::new(state.pool())
        .get(id)
        .await
        .map_err(or_not_found("Banner"))?;
    Ok(Json(banner))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<BannerRequest>,
) -> Result<(StatusCode, Json<Banner>), AppError> {
    let input = BannerInput::try_from(req)?;
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    info!(banner_id = %banner.id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

#[instrument(skip_all, fields(admin_id = %admin.id, banner_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<BannerId>,
    ApiJson(req): ApiJson<BannerRequest>,
) -> Result<Json<Banner>, AppError> {
    let input = BannerInput::try_from(req)?;
    let banner = BannerRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Banner"))?;
    info!("Banner updated");
    Ok(Json(banner))
}

#[instrument(skip_all, fields(admin_id = %admin.id, banner_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<BannerId>,
) -> Result<StatusCode, AppError> {
    BannerRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Banner"))?;
    info!("Banner deleted");
    Ok(StatusCode::NO_CONTENT)
}
