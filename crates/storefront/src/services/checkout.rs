//! Checkout: pricing, order placement and Razorpay payment confirmation.
//!
//! ```text
//! cart ──create-order──> order (pending_payment) ──Razorpay order──> widget
//!                                                                    │
//!        paid <──verify (payment signature)──────────────────────────┤
//!        paid <──webhook payment.captured / order.paid (body HMAC)───┘
//! ```
//!
//! Cash-on-delivery skips the gateway and goes straight to `processing`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use cradlix_core::{
    AddressId, Email, Money, MoneyError, OrderId, OrderStatus, PaymentMethod, UserId,
};

use crate::config::{CheckoutConfig, RazorpayConfig};
use crate::db::payment_events::PaymentEvent;
use crate::db::{
    AddressRepository, CartRepository, OrderRepository, PaymentEventRepository, RepositoryError,
};
use crate::models::{AddressSnapshot, CurrentUser, Order};
use crate::services::razorpay::{
    CreateOrderRequest, RazorpayClient, RazorpayError, verify_payment_signature,
    verify_webhook_signature,
};

/// Storefront name shown in the checkout widget.
const MERCHANT_NAME: &str = "Cradlix";

/// Payment event for money captured against an order that can no longer be
/// paid. Staff refund these from the Razorpay dashboard.
pub const REFUND_REQUIRED_EVENT: &str = "payment.refund_required";

/// Shipping rules applied to a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    free_shipping_threshold: Money,
    shipping_fee: Money,
}

impl From<CheckoutConfig> for Pricing {
    fn from(config: CheckoutConfig) -> Self {
        Self {
            free_shipping_threshold: config.free_shipping_threshold,
            shipping_fee: config.shipping_fee,
        }
    }
}

/// Subtotal, shipping and grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

impl Pricing {
    /// Apply the shipping rule. An empty cart ships for nothing.
    #[must_use]
    pub fn totals(&self, subtotal: Money) -> Totals {
        let shipping_fee = if subtotal.is_zero() || subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.shipping_fee
        };
        Totals {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }
}

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("address not found")]
    AddressNotFound,

    #[error("order not found")]
    OrderNotFound,

    /// Payment signature did not match.
    #[error("payment verification failed")]
    InvalidSignature,

    /// Webhook signature missing or wrong.
    #[error("invalid webhook signature")]
    InvalidWebhookSignature,

    /// No webhook secret configured.
    #[error("webhooks are not enabled")]
    WebhooksDisabled,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("invalid order amount: {0}")]
    Amount(#[from] MoneyError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] RazorpayError),
}

/// `POST /api/payment/create-order` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderForm {
    pub address_id: AddressId,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
}

const fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Razorpay
}

/// `POST /api/payment/verify` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentForm {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// `POST /api/payment/failed` body, as reported by the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailureForm {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub reason: Option<String>,
}

/// Everything the Razorpay widget needs to open.
#[derive(Debug, Clone, Serialize)]
pub struct RazorpayCheckout {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: &'static str,
    pub key_id: String,
    pub name: &'static str,
    pub customer_name: String,
    pub email: Email,
    pub phone: String,
}

/// Result of placing an order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlacedOrder {
    Razorpay(RazorpayCheckout),
    CashOnDelivery { order_id: OrderId, status: OrderStatus },
}

/// What a webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The referenced order is now paid.
    Paid(OrderId),
    /// Recorded only.
    Logged,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    payment: Option<Entity<PaymentEntity>>,
    order: Option<Entity<OrderEntity>>,
}

#[derive(Debug, Deserialize)]
struct Entity<T> {
    entity: T,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderEntity {
    id: String,
}

impl WebhookEnvelope {
    fn razorpay_order_id(&self) -> Option<&str> {
        self.payload
            .order
            .as_ref()
            .map(|o| o.entity.id.as_str())
            .or_else(|| {
                self.payload
                    .payment
                    .as_ref()
                    .and_then(|p| p.entity.order_id.as_deref())
            })
    }

    fn razorpay_payment_id(&self) -> Option<&str> {
        self.payload.payment.as_ref().map(|p| p.entity.id.as_str())
    }

    fn marks_paid(&self) -> bool {
        matches!(self.event.as_str(), "payment.captured" | "order.paid")
    }
}

/// Checkout orchestration over the cart, order and payment-event repositories.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    razorpay: &'a RazorpayClient,
    razorpay_config: &'a RazorpayConfig,
    pricing: Pricing,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub fn new(
        pool: &'a PgPool,
        razorpay: &'a RazorpayClient,
        razorpay_config: &'a RazorpayConfig,
        checkout: CheckoutConfig,
    ) -> Self {
        Self {
            pool,
            razorpay,
            razorpay_config,
            pricing: Pricing::from(checkout),
        }
    }

    /// Turn the cart into an order and, for Razorpay, open a gateway order.
    ///
    /// When the gateway call fails the new order is cancelled and its stock
    /// released before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `AddressNotFound`, a repository
    /// conflict naming an unavailable product, or `Gateway`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        form: &CreateOrderForm,
    ) -> Result<PlacedOrder, CheckoutError> {
        if CartRepository::new(self.pool).lines(user.id).await?.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let address = AddressRepository::new(self.pool)
            .get(user.id, form.address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;
        let snapshot = AddressSnapshot::from(&address);

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .create(user.id, form.payment_method, &snapshot, &self.pricing)
            .await?;
        info!(order_id = %order.id, total = %order.total, payment_method = %order.payment_method, "Order placed");

        if form.payment_method == PaymentMethod::CashOnDelivery {
            return Ok(PlacedOrder::CashOnDelivery {
                order_id: order.id,
                status: order.status,
            });
        }

        let amount = order.total.to_paise()?;
        let request = CreateOrderRequest {
            amount,
            currency: Money::CURRENCY.to_string(),
            receipt: order.receipt.clone().unwrap_or_default(),
            notes: BTreeMap::from([
                ("order_id".to_string(), order.id.to_string()),
                ("user_id".to_string(), user.id.to_string()),
            ]),
        };

        let gateway_order = match self.razorpay.create_order(&request).await {
            Ok(gateway_order) => gateway_order,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Razorpay order creation failed, cancelling");
                if let Err(cancel_err) = orders.cancel(order.id, &[OrderStatus::PendingPayment]).await {
                    warn!(order_id = %order.id, error = %cancel_err, "Failed to cancel order after gateway error");
                }
                return Err(CheckoutError::Gateway(e));
            }
        };
        orders
            .set_razorpay_order_id(order.id, &gateway_order.id)
            .await?;

        Ok(PlacedOrder::Razorpay(RazorpayCheckout {
            order_id: order.id,
            razorpay_order_id: gateway_order.id,
            amount,
            currency: Money::CURRENCY,
            key_id: self.razorpay.key_id().to_string(),
            name: MERCHANT_NAME,
            customer_name: user.name.clone(),
            email: user.email.clone(),
            phone: address.phone.e164(),
        }))
    }

    /// Confirm a payment reported by the checkout widget.
    ///
    /// Idempotent for orders that are already paid. A genuine payment for a
    /// cancelled order is flagged with a `payment.refund_required` event.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidSignature` on a signature mismatch,
    /// `OrderNotFound` if the order is not the user's, or a repository
    /// conflict if the order was cancelled.
    #[instrument(skip(self, form), fields(razorpay_order_id = %form.razorpay_order_id))]
    pub async fn verify_payment(
        &self,
        user_id: UserId,
        form: &VerifyPaymentForm,
    ) -> Result<Order, CheckoutError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .find_by_razorpay_order_id(&form.razorpay_order_id)
            .await?
            .filter(|o| o.user_id == user_id);

        let valid = verify_payment_signature(
            &form.razorpay_order_id,
            &form.razorpay_payment_id,
            &form.razorpay_signature,
            &self.razorpay_config.key_secret,
        );
        let event = if valid {
            "payment.verified"
        } else {
            "payment.signature_mismatch"
        };
        self.record(
            event,
            order.as_ref().map(|o| o.id),
            Some(&form.razorpay_order_id),
            Some(&form.razorpay_payment_id),
            serde_json::to_value(form).unwrap_or_default(),
        )
        .await;

        if !valid {
            warn!("Payment signature mismatch");
            return Err(CheckoutError::InvalidSignature);
        }
        let order = order.ok_or(CheckoutError::OrderNotFound)?;

        let paid = match orders.mark_paid(order.id, &form.razorpay_payment_id).await {
            Ok(paid) => paid,
            Err(RepositoryError::Conflict(reason)) => {
                self.flag_refund(&order, &form.razorpay_payment_id, &reason)
                    .await;
                return Err(RepositoryError::Conflict(reason).into());
            }
            Err(e) => return Err(e.into()),
        };
        info!(order_id = %paid.id, status = %paid.status, "Payment verified");
        Ok(paid)
    }

    /// Record a failed payment attempt. The order stays `pending_payment`
    /// so the widget can retry.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order is not the user's.
    #[instrument(skip(self, form), fields(razorpay_order_id = %form.razorpay_order_id))]
    pub async fn record_failure(
        &self,
        user_id: UserId,
        form: &PaymentFailureForm,
    ) -> Result<Order, CheckoutError> {
        let order = OrderRepository::new(self.pool)
            .find_by_razorpay_order_id(&form.razorpay_order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(CheckoutError::OrderNotFound)?;

        PaymentEventRepository::new(self.pool)
            .record(PaymentEvent {
                event: "payment.failed",
                order_id: Some(order.id),
                razorpay_order_id: Some(&form.razorpay_order_id),
                razorpay_payment_id: form.razorpay_payment_id.as_deref(),
                payload: serde_json::to_value(form).unwrap_or_default(),
            })
            .await?;

        info!(
            order_id = %order.id,
            code = form.code.as_deref().unwrap_or("unknown"),
            "Payment attempt failed"
        );
        Ok(order)
    }

    /// Handle a Razorpay webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::WebhooksDisabled` when no secret is configured,
    /// `InvalidWebhookSignature` on a bad signature, or `InvalidPayload`.
    #[instrument(skip_all)]
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, CheckoutError> {
        let secret = self
            .razorpay_config
            .webhook_secret
            .as_ref()
            .ok_or(CheckoutError::WebhooksDisabled)?;
        let signature = signature.ok_or(CheckoutError::InvalidWebhookSignature)?;
        if !verify_webhook_signature(body, signature, secret) {
            return Err(CheckoutError::InvalidWebhookSignature);
        }

        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| CheckoutError::InvalidPayload(e.to_string()))?;
        let envelope: WebhookEnvelope = serde_json::from_value(payload.clone())
            .map_err(|e| CheckoutError::InvalidPayload(e.to_string()))?;

        let orders = OrderRepository::new(self.pool);
        let order = match envelope.razorpay_order_id() {
            Some(id) => orders.find_by_razorpay_order_id(id).await?,
            None => None,
        };

        PaymentEventRepository::new(self.pool)
            .record(PaymentEvent {
                event: &envelope.event,
                order_id: order.as_ref().map(|o| o.id),
                razorpay_order_id: envelope.razorpay_order_id(),
                razorpay_payment_id: envelope.razorpay_payment_id(),
                payload,
            })
            .await?;

        let (Some(order), Some(payment_id), true) =
            (order, envelope.razorpay_payment_id(), envelope.marks_paid())
        else {
            debug!(event = %envelope.event, "Webhook event logged");
            return Ok(WebhookOutcome::Logged);
        };

        match orders.mark_paid(order.id, payment_id).await {
            Ok(paid) => {
                info!(order_id = %paid.id, event = %envelope.event, "Order paid via webhook");
                Ok(WebhookOutcome::Paid(paid.id))
            }
            Err(RepositoryError::Conflict(reason)) => {
                self.flag_refund(&order, payment_id, &reason).await;
                Ok(WebhookOutcome::Logged)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Log a captured payment that could not be applied. WARN reaches Sentry.
    async fn flag_refund(&self, order: &Order, razorpay_payment_id: &str, reason: &str) {
        warn!(
            order_id = %order.id,
            razorpay_payment_id,
            %reason,
            "Payment captured for an order that cannot be paid, refund required"
        );
        self.record(
            REFUND_REQUIRED_EVENT,
            Some(order.id),
            order.razorpay_order_id.as_deref(),
            Some(razorpay_payment_id),
            serde_json::json!({
                "reason": reason,
                "total": order.total,
            }),
        )
        .await;
    }

    /// Best-effort event log; a failed insert must not fail the payment.
    async fn record(
        &self,
        event: &str,
        order_id: Option<OrderId>,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        payload: serde_json::Value,
    ) {
        let result = PaymentEventRepository::new(self.pool)
            .record(PaymentEvent {
                event,
                order_id,
                razorpay_order_id,
                razorpay_payment_id,
                payload,
            })
            .await;
        if let Err(e) = result {
            warn!(event, error = %e, "Failed to record payment event");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pricing() -> Pricing {
        Pricing::from(CheckoutConfig::default())
    }

    #[test]
    fn test_shipping_below_threshold() {
        let totals = pricing().totals(Money::from_rupees(498));
        assert_eq!(totals.shipping_fee, Money::from_rupees(49));
        assert_eq!(totals.total, Money::from_rupees(547));
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let totals = pricing().totals(Money::from_rupees(499));
        assert_eq!(totals.shipping_fee, Money::ZERO);
        assert_eq!(totals.total, Money::from_rupees(499));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = pricing().totals(Money::ZERO);
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn test_custom_pricing() {
        let pricing = Pricing::from(CheckoutConfig {
            free_shipping_threshold: Money::from_rupees(999),
            shipping_fee: Money::from_paise(7_900),
        });
        let totals = pricing.totals(Money::from_paise(50_050));
        assert_eq!(totals.total, Money::from_paise(57_950));
    }

    #[test]
    fn test_create_order_form_defaults_to_razorpay() {
        let form: CreateOrderForm = serde_json::from_str(r#"{"address_id": 7}"#).unwrap();
        assert_eq!(form.payment_method, PaymentMethod::Razorpay);
        let form: CreateOrderForm =
            serde_json::from_str(r#"{"address_id": 7, "payment_method": "cod"}"#).unwrap();
        assert_eq!(form.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_payment_captured_envelope() {
        let body = r#"{
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "amount": 34900,
                        "status": "captured"
                    }
                }
            }
        }"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.marks_paid());
        assert_eq!(envelope.razorpay_order_id(), Some("order_9A33XWu170gUtm"));
        assert_eq!(envelope.razorpay_payment_id(), Some("pay_29QQoUBi66xm2f"));
    }

    #[test]
    fn test_order_paid_envelope_prefers_order_entity() {
        let body = r#"{
            "event": "order.paid",
            "payload": {
                "payment": {"entity": {"id": "pay_A", "order_id": null}},
                "order": {"entity": {"id": "order_B", "status": "paid"}}
            }
        }"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.marks_paid());
        assert_eq!(envelope.razorpay_order_id(), Some("order_B"));
    }

    #[test]
    fn test_other_events_only_logged() {
        let envelope: WebhookEnvelope =
            serde_json::from_str(r#"{"event": "refund.created"}"#).unwrap();
        assert!(!envelope.marks_paid());
        assert_eq!(envelope.razorpay_order_id(), None);
    }

    #[test]
    fn test_placed_order_serialization() {
        let cod = PlacedOrder::CashOnDelivery {
            order_id: OrderId::new(12),
            status: OrderStatus::Processing,
        };
        let json = serde_json::to_value(&cod).unwrap();
        assert_eq!(json["order_id"], 12);
        assert_eq!(json["status"], "processing");
    }

    mod gateway {
        use hmac::{Hmac, Mac};
        use secrecy::SecretString;
        use sha2::Sha256;

        use super::*;
        use crate::config::test_config;
        use crate::db::fixtures;
        use crate::services::razorpay::stub;

        const WEBHOOK_SECRET: &str = "whsec_9fK2pQ7xLm4Rt8Vb";

        fn sign(secret: &str, message: &[u8]) -> String {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
            mac.update(message);
            hex::encode(mac.finalize().into_bytes())
        }

        struct Gateway {
            client: RazorpayClient,
            config: RazorpayConfig,
        }

        impl Gateway {
            async fn start() -> Self {
                let (api_base, _) = stub::spawn().await;
                let config = RazorpayConfig {
                    api_base,
                    webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
                    ..test_config().razorpay
                };
                Self {
                    client: RazorpayClient::new(&config).unwrap(),
                    config,
                }
            }

            fn service<'a>(&'a self, pool: &'a PgPool) -> CheckoutService<'a> {
                CheckoutService::new(pool, &self.client, &self.config, CheckoutConfig::default())
            }
        }

        fn verify_form(checkout: &RazorpayCheckout, payment_id: &str) -> VerifyPaymentForm {
            let message = format!("{}|{payment_id}", checkout.razorpay_order_id);
            VerifyPaymentForm {
                razorpay_order_id: checkout.razorpay_order_id.clone(),
                razorpay_payment_id: payment_id.to_string(),
                razorpay_signature: sign("thisisnotarealkeyJ9q2", message.as_bytes()),
            }
        }

        fn captured(checkout: &RazorpayCheckout, payment_id: &str) -> (Vec<u8>, String) {
            let body = serde_json::json!({
                "entity": "event",
                "event": "payment.captured",
                "payload": {
                    "payment": {
                        "entity": {
                            "id": payment_id,
                            "order_id": checkout.razorpay_order_id,
                            "amount": checkout.amount,
                            "status": "captured"
                        }
                    }
                }
            })
            .to_string()
            .into_bytes();
            let signature = sign(WEBHOOK_SECRET, &body);
            (body, signature)
        }

        /// A customer with one item in the cart and a Razorpay order open for it.
        async fn checkout(pool: &PgPool, service: &CheckoutService<'_>) -> (CurrentUser, RazorpayCheckout) {
            let user = fixtures::customer(pool, "parent@cradlix.test").await;
            let product = fixtures::product(pool, "muslin-swaddle", Money::from_rupees(349), 5).await;
            fixtures::add_to_cart(pool, user.id, product, 1).await;
            let address_id = fixtures::address(pool, user.id).await;

            let placed = service
                .place_order(
                    &user,
                    &CreateOrderForm {
                        address_id,
                        payment_method: PaymentMethod::Razorpay,
                    },
                )
                .await
                .unwrap();
            let PlacedOrder::Razorpay(checkout) = placed else {
                panic!("expected a Razorpay checkout");
            };
            (user, checkout)
        }

        async fn cancel(pool: &PgPool, order_id: OrderId) {
            OrderRepository::new(pool)
                .cancel(order_id, &[OrderStatus::PendingPayment])
                .await
                .unwrap();
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_place_order_opens_gateway_order(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (user, checkout) = checkout(&pool, &service).await;

            assert!(checkout.razorpay_order_id.starts_with("order_cradlix_"));
            // 349 + 49 shipping, in paise
            assert_eq!(checkout.amount, 39_800);
            assert_eq!(checkout.key_id, "rzp_test_1DP5mmOlF5G5ag");
            assert_eq!(checkout.phone, "+919876543210");

            let order = OrderRepository::new(&pool)
                .find_by_razorpay_order_id(&checkout.razorpay_order_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(order.id, checkout.order_id);
            assert_eq!(order.status, OrderStatus::PendingPayment);
            assert_eq!(fixtures::cart_lines(&pool, user.id).await, 1);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_verify_marks_paid_and_repeats_quietly(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (user, checkout) = checkout(&pool, &service).await;
            let form = verify_form(&checkout, "pay_29QQoUBi66xm2f");

            let paid = service.verify_payment(user.id, &form).await.unwrap();
            assert_eq!(paid.id, checkout.order_id);
            assert_eq!(paid.status, OrderStatus::Paid);
            assert_eq!(paid.razorpay_payment_id.as_deref(), Some("pay_29QQoUBi66xm2f"));
            assert_eq!(fixtures::cart_lines(&pool, user.id).await, 0);

            let again = service.verify_payment(user.id, &form).await.unwrap();
            assert_eq!(again.id, paid.id);
            assert_eq!(again.status, OrderStatus::Paid);
            assert_eq!(again.paid_at, paid.paid_at);
            assert_eq!(fixtures::payment_events(&pool, "payment.verified").await, 2);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_verify_rejects_forged_signature(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (user, checkout) = checkout(&pool, &service).await;
            let mut form = verify_form(&checkout, "pay_29QQoUBi66xm2f");
            form.razorpay_signature = sign("some-other-secret", b"forged");

            let err = service.verify_payment(user.id, &form).await.unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidSignature));

            let order = OrderRepository::new(&pool)
                .get_for_user(user.id, checkout.order_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(order.status, OrderStatus::PendingPayment);
            assert_eq!(
                fixtures::payment_events(&pool, "payment.signature_mismatch").await,
                1
            );
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_verify_for_cancelled_order_flags_refund(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (user, checkout) = checkout(&pool, &service).await;
            cancel(&pool, checkout.order_id).await;

            let form = verify_form(&checkout, "pay_IluHdL3l2b1aFa");
            let err = service.verify_payment(user.id, &form).await.unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::Repository(RepositoryError::Conflict(_))
            ));
            assert_eq!(fixtures::payment_events(&pool, REFUND_REQUIRED_EVENT).await, 1);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_webhook_capture_marks_paid(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (user, checkout) = checkout(&pool, &service).await;
            let (body, signature) = captured(&checkout, "pay_29QQoUBi66xm2f");

            let outcome = service.handle_webhook(&body, Some(&signature)).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Paid(checkout.order_id));
            assert_eq!(fixtures::cart_lines(&pool, user.id).await, 0);
            assert_eq!(fixtures::payment_events(&pool, "payment.captured").await, 1);

            // Razorpay redelivers until it sees a 2xx.
            let outcome = service.handle_webhook(&body, Some(&signature)).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Paid(checkout.order_id));
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_webhook_capture_after_cancel_flags_refund(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (_, checkout) = checkout(&pool, &service).await;
            cancel(&pool, checkout.order_id).await;
            let (body, signature) = captured(&checkout, "pay_IluHdL3l2b1aFa");

            let outcome = service.handle_webhook(&body, Some(&signature)).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Logged);
            assert_eq!(fixtures::payment_events(&pool, REFUND_REQUIRED_EVENT).await, 1);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
        async fn test_webhook_rejects_tampered_body(pool: PgPool) {
            let gateway = Gateway::start().await;
            let service = gateway.service(&pool);
            let (_, checkout) = checkout(&pool, &service).await;
            let (_, signature) = captured(&checkout, "pay_29QQoUBi66xm2f");
            let (forged, _) = captured(&checkout, "pay_somebodyElse0");

            let err = service.handle_webhook(&forged, Some(&signature)).await.unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidWebhookSignature));
            let err = service.handle_webhook(&forged, None).await.unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidWebhookSignature));
        }
    }
}
