//! Profile route handlers.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, ProfileInput, ProfileRequest, User, session_keys};
use crate::routes::or_not_found;
use crate::state::AppState;

/// The logged-in user's profile.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>, AppError> {
    let profile = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
    Ok(Json(profile))
}

/// Update name and phone.
///
/// The session copy of the user is refreshed so `/api/auth/me` shows the new name.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<Json<User>, AppError> {
    let input = ProfileInput::try_from(req)?;
    let profile = UserRepository::new(state.pool())
        .update_profile(user.id, &input.name, input.phone.as_ref())
        .await
        .map_err(or_not_found("Account"))?;

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&profile))
        .await?;
    info!("Profile updated");
    Ok(Json(profile))
}
