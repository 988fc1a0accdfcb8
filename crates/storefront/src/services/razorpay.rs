//! Razorpay Orders API client and signature checks.
//!
//! The browser checkout widget needs a gateway order id before it can take a
//! payment. After payment the widget hands back
//! `(razorpay_order_id, razorpay_payment_id, razorpay_signature)`, and the
//! signature is checked with the key secret. Webhooks are signed over the raw
//! body with a separate webhook secret.

use std::collections::BTreeMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::RazorpayConfig;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

type HmacSha256 = Hmac<Sha256>;

/// Errors from the Razorpay API.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Key id / secret rejected.
    #[error("Razorpay rejected the API credentials")]
    Unauthorized,

    /// Request was invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Too many requests.
    #[error("rate limited by Razorpay")]
    RateLimited,

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// `POST /orders` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

/// An order as returned by Razorpay.
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    description: Option<String>,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, RazorpayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    /// Public key id for the checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Razorpay rejects it.
    #[instrument(skip(self), fields(receipt = %request.receipt, amount = request.amount))]
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<RazorpayOrder, RazorpayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let order: RazorpayOrder = response.json().await?;
        debug!(razorpay_order_id = %order.id, "Razorpay order created");
        Ok(order)
    }
}

fn error_from_response(status: StatusCode, body: &str) -> RazorpayError {
    let description = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.description);

    match status {
        StatusCode::UNAUTHORIZED => RazorpayError::Unauthorized,
        StatusCode::BAD_REQUEST => {
            RazorpayError::BadRequest(description.unwrap_or_else(|| body.to_string()))
        }
        StatusCode::TOO_MANY_REQUESTS => RazorpayError::RateLimited,
        _ => RazorpayError::Api {
            status: status.as_u16(),
            message: description.unwrap_or_else(|| body.to_string()),
        },
    }
}

/// Check the checkout widget's payment signature:
/// `hex(HMAC-SHA256(key_secret, order_id + "|" + payment_id))`.
#[must_use]
pub fn verify_payment_signature(
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
    signature: &str,
    key_secret: &SecretString,
) -> bool {
    let message = format!("{razorpay_order_id}|{razorpay_payment_id}");
    verify_hex_hmac(key_secret, message.as_bytes(), signature)
}

/// Check a webhook's `X-Razorpay-Signature`: `hex(HMAC-SHA256(webhook_secret, body))`.
#[must_use]
pub fn verify_webhook_signature(body: &[u8], signature: &str, webhook_secret: &SecretString) -> bool {
    verify_hex_hmac(webhook_secret, body, signature)
}

fn verify_hex_hmac(secret: &SecretString, message: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(message);
    // verify_slice compares in constant time
    mac.verify_slice(&expected).is_ok()
}

/// A local stand-in for the Orders API, for tests that drive
/// [`RazorpayClient`] over real HTTP.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod stub {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    /// `(Authorization header, JSON body)` of every request served.
    #[derive(Clone, Default)]
    pub struct Received(Arc<Mutex<Vec<(Option<String>, Value)>>>);

    impl Received {
        pub fn requests(&self) -> Vec<(Option<String>, Value)> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Serve `POST /v1/orders` on an ephemeral port and return the API base.
    ///
    /// Orders are created as `order_<receipt>`. Amounts under one rupee are
    /// rejected the way Razorpay rejects them.
    pub async fn spawn() -> (String, Received) {
        let received = Received::default();
        let app = Router::new()
            .route("/v1/orders", post(create_order))
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/v1"), received)
    }

    async fn create_order(
        State(received): State<Received>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        received.0.lock().unwrap().push((auth, body.clone()));

        if body["amount"].as_i64().unwrap_or(0) < 100 {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "code": "BAD_REQUEST_ERROR",
                        "description": "The amount must be atleast INR 1.00"
                    }
                })),
            );
        }

        let receipt = body["receipt"].as_str().unwrap_or_default();
        (
            StatusCode::OK,
            Json(json!({
                "id": format!("order_{receipt}"),
                "entity": "order",
                "amount": body["amount"],
                "currency": body["currency"],
                "receipt": receipt,
                "status": "created",
            })),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sign(secret: &str, message: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("valid key length");
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_payment_signature_accepts_valid() {
        let secret = SecretString::from("EnLs21M47BllR3X8PSFtjtbd");
        let signature = sign("EnLs21M47BllR3X8PSFtjtbd", b"order_IluGWxBm9U8zJ8|pay_IluHdL3l2b1aFa");
        assert!(verify_payment_signature(
            "order_IluGWxBm9U8zJ8",
            "pay_IluHdL3l2b1aFa",
            &signature,
            &secret
        ));
    }

    #[test]
    fn test_payment_signature_rejects_swapped_ids() {
        let secret = SecretString::from("EnLs21M47BllR3X8PSFtjtbd");
        let signature = sign("EnLs21M47BllR3X8PSFtjtbd", b"order_A|pay_B");
        assert!(!verify_payment_signature("pay_B", "order_A", &signature, &secret));
    }

    #[test]
    fn test_payment_signature_rejects_wrong_secret() {
        let signature = sign("another-secret", b"order_A|pay_B");
        let secret = SecretString::from("EnLs21M47BllR3X8PSFtjtbd");
        assert!(!verify_payment_signature("order_A", "pay_B", &signature, &secret));
    }

    #[test]
    fn test_signature_rejects_garbage() {
        let secret = SecretString::from("EnLs21M47BllR3X8PSFtjtbd");
        assert!(!verify_payment_signature("order_A", "pay_B", "", &secret));
        assert!(!verify_payment_signature("order_A", "pay_B", "not-hex", &secret));
        assert!(!verify_payment_signature("order_A", "pay_B", "abcd", &secret));
    }

    #[test]
    fn test_webhook_signature_over_raw_body() {
        let secret = SecretString::from("whsec_9fK2pQ7xLm4Rt8Vb");
        let body = br#"{"event":"payment.captured","payload":{}}"#;
        let signature = sign("whsec_9fK2pQ7xLm4Rt8Vb", body);
        assert!(verify_webhook_signature(body, &signature, &secret));
        assert!(verify_webhook_signature(
            body,
            &signature.to_uppercase(),
            &secret
        ));

        let tampered = br#"{"event":"payment.captured","payload":{"x":1}}"#;
        assert!(!verify_webhook_signature(tampered, &signature, &secret));
    }

    #[test]
    fn test_error_mapping() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The amount must be atleast INR 1.00"}}"#;
        match error_from_response(StatusCode::BAD_REQUEST, body) {
            RazorpayError::BadRequest(msg) => assert_eq!(msg, "The amount must be atleast INR 1.00"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, body),
            RazorpayError::Unauthorized
        ));
        assert!(matches!(
            error_from_response(StatusCode::TOO_MANY_REQUESTS, ""),
            RazorpayError::RateLimited
        ));
        match error_from_response(StatusCode::BAD_GATEWAY, "upstream down") {
            RazorpayError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_create_order_request_omits_empty_notes() {
        let request = CreateOrderRequest {
            amount: 34_900,
            currency: "INR".to_string(),
            receipt: "cradlix_1_abcdefgh".to_string(),
            notes: BTreeMap::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 34_900);
        assert!(json.get("notes").is_none());
    }

    fn stub_config(api_base: String) -> RazorpayConfig {
        RazorpayConfig {
            api_base,
            ..crate::config::test_config().razorpay
        }
    }

    #[tokio::test]
    async fn test_create_order_against_local_api() {
        let (api_base, received) = stub::spawn().await;
        // Trailing slash is trimmed.
        let client = RazorpayClient::new(&stub_config(format!("{api_base}/"))).unwrap();

        let order = client
            .create_order(&CreateOrderRequest {
                amount: 54_800,
                currency: "INR".to_string(),
                receipt: "cradlix_7_Qm3xT9aB".to_string(),
                notes: BTreeMap::from([("order_id".to_string(), "7".to_string())]),
            })
            .await
            .unwrap();

        assert_eq!(order.id, "order_cradlix_7_Qm3xT9aB");
        assert_eq!(order.amount, 54_800);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.receipt.as_deref(), Some("cradlix_7_Qm3xT9aB"));
        assert_eq!(order.status, "created");

        let requests = received.requests();
        let [(auth, body)] = requests.as_slice() else {
            panic!("expected one request, got {}", requests.len());
        };
        // base64("rzp_test_1DP5mmOlF5G5ag:thisisnotarealkeyJ9q2")
        assert_eq!(
            auth.as_deref(),
            Some("Basic cnpwX3Rlc3RfMURQNW1tT2xGNUc1YWc6dGhpc2lzbm90YXJlYWxrZXlKOXEy")
        );
        assert_eq!(body["amount"], 54_800);
        assert_eq!(body["receipt"], "cradlix_7_Qm3xT9aB");
        assert_eq!(body["notes"]["order_id"], "7");
    }

    #[tokio::test]
    async fn test_create_order_surfaces_gateway_rejection() {
        let (api_base, _) = stub::spawn().await;
        let client = RazorpayClient::new(&stub_config(api_base)).unwrap();

        let err = client
            .create_order(&CreateOrderRequest {
                amount: 50,
                currency: "INR".to_string(),
                receipt: "cradlix_8_zzzzzzzz".to_string(),
                notes: BTreeMap::new(),
            })
            .await
            .unwrap_err();
        match err {
            RazorpayError::BadRequest(msg) => assert_eq!(msg, "The amount must be atleast INR 1.00"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
