//! Store request review.
//!
//! Deciding a request emails the applicant when SMTP is configured. A failed
//! send is logged and does not undo the decision.

use axum::{Json, body::Bytes, extract::State};
use tracing::{error, info, instrument};

use cradlix_core::StoreRequestId;

use crate::db::StoreRequestRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, Decision, DecisionRequest, Page, StoreRequest, StoreRequestFilter};
use crate::routes::{PageParams, or_not_found};
use crate::state::AppState;

const REQUESTS_PER_PAGE: u32 = 20;

/// Requests, pending first.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(filter): ApiQuery<StoreRequestFilter>,
) -> Result<Json<Page<StoreRequest>>, AppError> {
    let (page, limit, offset) = PageParams { page: filter.page }.window(REQUESTS_PER_PAGE)?;
    let (requests, total) = StoreRequestRepository::new(state.pool())
        .list(filter.status, limit, offset)
        .await?;
    Ok(Json(Page::new(requests, page, REQUESTS_PER_PAGE, total)))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<StoreRequestId>,
) -> Result<Json<StoreRequest>, AppError> {
    let request = StoreRequestRepository::new(state.pool())
        .get(id)
        .await
        .map_err(or_not_found("Store request"))?;
    Ok(Json(request))
}

/// Approve and promote the applicant to seller. The body may be empty.
#[instrument(skip_all, fields(admin_id = %admin.id, store_request_id = %id))]
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<StoreRequestId>,
    body: Bytes,
) -> Result<Json<StoreRequest>, AppError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        DecisionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };
    decide(&state, &admin, id, Decision::approve(req)?).await
}

/// Reject with a note for the applicant.
#[instrument(skip_all, fields(admin_id = %admin.id, store_request_id = %id))]
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<StoreRequestId>,
    ApiJson(req): ApiJson<DecisionRequest>,
) -> Result<Json<StoreRequest>, AppError> {
    decide(&state, &admin, id, Decision::reject(req)?).await
}

async fn decide(
    state: &AppState,
    admin: &CurrentAdmin,
    id: StoreRequestId,
    decision: Decision,
) -> Result<Json<StoreRequest>, AppError> {
    let request = StoreRequestRepository::new(state.pool())
        .decide(id, admin.id, &decision)
        .await
        .map_err(or_not_found("Store request"))?;

    info!(
        status = %request.status,
        applicant_id = %request.user_id,
        "Store request decided"
    );
    add_breadcrumb(
        "store_request",
        "Store request decided",
        &[("status", request.status.to_string())],
    );

    match state.email() {
        Some(email) => {
            if let Err(e) = email.send_store_request_decision(&request).await {
                error!(error = %e, "Failed to send store request decision email");
            }
        }
        None => info!("SMTP not configured, skipping decision email"),
    }

    Ok(Json(request))
}
