//! Helpers for end-to-end tests against running Cradlix servers.
//!
//! The tests in `tests/` are `#[ignore]`d; they need a migrated and seeded
//! database plus both servers:
//!
//! ```bash
//! cradlix-cli migrate
//! cradlix-cli seed catalog seed/catalog.yaml
//! CRADLIX_ADMIN_PASSWORD=... cradlix-cli admin create -e admin@cradlix.test -n Admin
//! cargo run -p cradlix-storefront &
//! cargo run -p cradlix-admin &
//! cargo test -p cradlix-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` and `ADMIN_BASE_URL` point the tests elsewhere.
//! Admin tests log in with `CRADLIX_TEST_ADMIN_EMAIL` and
//! `CRADLIX_ADMIN_PASSWORD`.

#![allow(clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every throwaway customer account.
pub const CUSTOMER_PASSWORD: &str = "correct-horse-battery";

#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps session cookies between requests.
///
/// Each client claims its own private `X-Real-IP`, which is what the
/// servers' login rate limiters key on.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-real-ip",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh address nobody has registered with yet.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@cradlix.test", Uuid::new_v4().simple())
}

/// Register a new customer on `client` and return the account body.
pub async fn register_customer(client: &Client) -> Value {
    let resp = client
        .post(format!("{}/api/auth/register", storefront_url()))
        .json(&json!({
            "email": unique_email(),
            "password": CUSTOMER_PASSWORD,
            "name": "Test Parent",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("register body")
}

/// Log `client` into the back office with the test admin account.
pub async fn login_admin(client: &Client) {
    let email = std::env::var("CRADLIX_TEST_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@cradlix.test".to_string());
    let password =
        std::env::var("CRADLIX_ADMIN_PASSWORD").expect("CRADLIX_ADMIN_PASSWORD must be set");

    let resp = client
        .post(format!("{}/api/admin/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("admin login request failed");
    assert_eq!(resp.status(), StatusCode::OK, "admin login rejected");
}

/// Product detail by slug, straight from the storefront.
pub async fn product(client: &Client, slug: &str) -> Value {
    let resp = client
        .get(format!("{}/api/products/{slug}", storefront_url()))
        .send()
        .await
        .expect("product request failed");
    assert_eq!(resp.status(), StatusCode::OK, "product {slug} missing; is the catalog seeded?");
    resp.json().await.expect("product body")
}

/// Save a delivery address for the logged-in customer and return it.
pub async fn save_address(client: &Client, line1: &str, is_default: bool) -> Value {
    client
        .post(format!("{}/api/user/addresses", storefront_url()))
        .json(&json!({
            "full_name": "Test Parent",
            "phone": "9876543210",
            "line1": line1,
            "city": "Bengaluru",
            "state": "Karnataka",
            "pincode": "560001",
            "is_default": is_default,
        }))
        .send()
        .await
        .expect("address request failed")
        .json()
        .await
        .expect("address body")
}

/// Add a default delivery address for the logged-in customer and return its id.
pub async fn add_address(client: &Client) -> i64 {
    let body = save_address(client, "12 MG Road", true).await;
    body["id"].as_i64().expect("address id")
}
