//! Saved address route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use cradlix_core::AddressId;

use crate::db::AddressRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, AddressRequest};
use crate::routes::or_not_found;
use crate::state::AppState;

/// Saved addresses, default first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>, AppError> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// Save a new address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<(StatusCode, Json<Address>), AppError> {
    let input = AddressInput::try_from(req)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    info!(address_id = %address.id, is_default = address.is_default, "Address added");
    Ok((StatusCode::CREATED, Json(address)))
}

/// Replace an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<Json<Address>, AppError> {
    let input = AddressInput::try_from(req)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await
        .map_err(or_not_found("Address"))?;
    Ok(Json(address))
}

/// Delete an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<StatusCode, AppError> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await
        .map_err(or_not_found("Address"))?;
    info!("Address deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the default.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn make_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<Json<Address>, AppError> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await
        .map_err(or_not_found("Address"))?;
    Ok(Json(address))
}
