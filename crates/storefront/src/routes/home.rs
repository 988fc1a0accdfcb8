//! Home page content.

use axum::{Json, extract::State, http::header::CACHE_CONTROL, response::IntoResponse};

use crate::error::AppError;
use crate::routes::PUBLIC_CACHE_CONTROL;
use crate::state::AppState;

/// Active banners, featured brands and published testimonials.
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let content = state.cache().home(state.pool()).await?;
    Ok(([(CACHE_CONTROL, PUBLIC_CACHE_CONTROL)], Json(content)))
}
