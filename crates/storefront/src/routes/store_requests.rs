//! Seller application route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use crate::db::{StoreRequestRepository, UserRepository};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{StoreRequest, StoreRequestForm, StoreRequestInput};
use crate::state::AppState;

/// Apply to sell on Cradlix.
///
/// The role is read from the database rather than the session, which may
/// predate an approval.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<StoreRequestForm>,
) -> Result<(StatusCode, Json<StoreRequest>), AppError> {
    let input = StoreRequestInput::try_from(form)?;

    let account = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))?;
    if !account.role.can_request_store() {
        return Err(AppError::BadRequest(
            "Your account already has seller access".to_string(),
        ));
    }

    let request = StoreRequestRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    info!(store_request_id = %request.id, store_name = %request.store_name, "Store request submitted");
    Ok((StatusCode::CREATED, Json(request)))
}

/// The user's store requests, newest first.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<StoreRequest>>, AppError> {
    let requests = StoreRequestRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(requests))
}
