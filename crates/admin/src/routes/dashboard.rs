//! Dashboard handler.

use axum::{Json, extract::State};

use crate::db::DashboardRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::Dashboard;
use crate::state::AppState;

/// Order counts, paid revenue and queue sizes.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = DashboardRepository::new(state.pool()).summary().await?;
    Ok(Json(dashboard))
}
