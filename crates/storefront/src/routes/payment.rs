//! Checkout and Razorpay callback handlers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use tracing::instrument;

use cradlix_core::{OrderId, OrderStatus};

use crate::error::{AppError, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::checkout::{
    CreateOrderForm, PaymentFailureForm, PlacedOrder, VerifyPaymentForm, WebhookOutcome,
};
use crate::state::AppState;

/// Header carrying the webhook body signature.
const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Response to a recorded payment failure.
#[derive(Debug, Serialize)]
pub struct FailureRecorded {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Place an order from the cart.
#[instrument(skip_all, fields(user_id = %user.id, payment_method = ?form.payment_method))]
pub async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<CreateOrderForm>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    add_breadcrumb(
        "checkout",
        "Placing order",
        &[("address_id", form.address_id.to_string())],
    );
    let placed = state.checkout().place_order(&user, &form).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Confirm a payment from the checkout widget's success callback.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<VerifyPaymentForm>,
) -> Result<Json<Order>, AppError> {
    let order = state.checkout().verify_payment(user.id, &form).await?;
    Ok(Json(order))
}

/// Record a failed attempt reported by the widget. The order stays payable.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn failed(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<PaymentFailureForm>,
) -> Result<Json<FailureRecorded>, AppError> {
    let order = state.checkout().record_failure(user.id, &form).await?;
    Ok(Json(FailureRecorded {
        order_id: order.id,
        status: order.status,
    }))
}

/// Razorpay webhook. Authenticated by the body signature, not the session.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let status = match state.checkout().handle_webhook(&body, signature).await? {
        WebhookOutcome::Paid(_) => "processed",
        WebhookOutcome::Logged => "logged",
    };
    Ok(Json(WebhookAck { status }))
}
