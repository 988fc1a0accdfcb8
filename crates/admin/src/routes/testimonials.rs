//! Testimonial management.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use cradlix_core::TestimonialId;

use crate::db::TestimonialRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Testimonial, TestimonialInput, TestimonialRequest};
use crate::routes::or_not_found;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Testimonial>>, AppError> {
    let testimonials = TestimonialRepository::new(state.pool()).list().await?;
    Ok(Json(testimonials))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<TestimonialId>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = TestimonialRepository::new(state.pool())
        .get(id)
        .await
        .map_err(or_not_found("Testimonial"))?;
    Ok(Json(testimonial))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<TestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>), AppError> {
    let input = TestimonialInput::try_from(req)?;
    let testimonial = TestimonialRepository::new(state.pool())
        .create(&input)
        .await?;
    info!(
        testimonial_id = %testimonial.id,
        rating = input.rating.get(),
        "Testimonial created"
    );
    Ok((StatusCode::CREATED, Json(testimonial)))
}

#[instrument(skip_all, fields(admin_id = %admin.id, testimonial_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<TestimonialId>,
    ApiJson(req): ApiJson<TestimonialRequest>,
) -> Result<Json<Testimonial>, AppError> {
    let input = TestimonialInput::try_from(req)?;
    let testimonial = TestimonialRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Testimonial"))?;
    info!(is_published = testimonial.is_published, "Testimonial updated");
    Ok(Json(testimonial))
}

#[instrument(skip_all, fields(admin_id = %admin.id, testimonial_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<TestimonialId>,
) -> Result<StatusCode, AppError> {
    TestimonialRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Testimonial"))?;
    info!("Testimonial deleted");
    Ok(StatusCode::NO_CONTENT)
}
