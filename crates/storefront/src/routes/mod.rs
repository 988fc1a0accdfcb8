//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/home                          - Banners, featured brands, testimonials
//!
//! # Auth (rate limited)
//! POST   /api/auth/register                 - Create account and log in
//! POST   /api/auth/login                    - Log in
//! POST   /api/auth/logout                   - Log out
//! GET    /api/auth/me                       - Session user
//!
//! # Account (requires auth)
//! GET    /api/user/profile                  - Profile
//! PUT    /api/user/profile                  - Update name / phone
//! GET    /api/user/addresses                - Saved addresses
//! POST   /api/user/addresses                - Add address
//! PUT    /api/user/addresses/{id}           - Edit address
//! DELETE /api/user/addresses/{id}           - Delete address
//! POST   /api/user/addresses/{id}/default   - Make default
//!
//! # Catalog
//! GET    /api/categories                    - All categories
//! GET    /api/brands                        - All brands
//! GET    /api/products                      - Filtered, paginated listing
//! GET    /api/products/{slug}               - Product detail
//! GET    /api/products/{slug}/reviews       - Reviews
//! POST   /api/products/{slug}/reviews       - Write a review (auth)
//!
//! # Cart (requires auth)
//! GET    /api/cart                          - Cart with totals
//! DELETE /api/cart                          - Empty cart
//! POST   /api/cart/items                    - Add product
//! PATCH  /api/cart/items/{product_id}       - Set quantity
//! DELETE /api/cart/items/{product_id}       - Remove product
//!
//! # Payment (rate limited, auth except webhook)
//! POST   /api/payment/create-order          - Place order
//! POST   /api/payment/verify                - Confirm Razorpay payment
//! POST   /api/payment/failed                - Record failed attempt
//! POST   /api/payment/webhook               - Razorpay webhook (signed body)
//!
//! # Orders (requires auth)
//! GET    /api/orders                        - Order history
//! GET    /api/orders/{id}                   - Order detail
//! POST   /api/orders/{id}/cancel            - Cancel
//!
//! # Store requests (requires auth)
//! POST   /api/store-requests                - Apply to sell
//! GET    /api/store-requests/mine           - Own applications
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod home;
pub mod orders;
pub mod payment;
pub mod reviews;
pub mod store_requests;
pub mod user;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, payment_rate_limiter};
use crate::state::AppState;

/// `Cache-Control` for data the server itself caches for five minutes.
pub(crate) const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

/// `?page=` for list endpoints with a fixed page size.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

impl PageParams {
    /// The requested page, 1-based.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for page 0.
    pub fn page(self) -> Result<u32, AppError> {
        match self.page {
            Some(0) => Err(AppError::BadRequest("page must be at least 1".to_string())),
            Some(page) => Ok(page),
            None => Ok(1),
        }
    }

    /// `(limit, offset)` for a page of `per_page` rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for page 0.
    pub fn window(self, per_page: u32) -> Result<(u32, i64, i64), AppError> {
        let page = self.page()?;
        let offset = i64::from(page - 1) * i64::from(per_page);
        Ok((page, i64::from(per_page), offset))
    }
}

/// Map a repository miss to a 404 naming the resource.
pub(crate) fn or_not_found(what: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(format!("{what} not found")),
        other => other.into(),
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(user::show).put(user::update))
        .route(
            "/addresses",
            get(addresses::index).post(addresses::create),
        )
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/addresses/{id}/default", post(addresses::make_default))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::products))
        .route("/{slug}", get(catalog::product))
        .route(
            "/{slug}/reviews",
            get(reviews::index).post(reviews::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create the payment routes router.
///
/// The webhook sits outside the per-IP limiter: Razorpay delivers from a
/// small pool of addresses and retries on 429.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payment::create_order))
        .route("/verify", post(payment::verify))
        .route("/failed", post(payment::failed))
        .layer(payment_rate_limiter())
        .route("/webhook", post(payment::webhook))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the store request routes router.
pub fn store_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(store_requests::create))
        .route("/mine", get(store_requests::mine))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/home", get(home::home))
        .route("/api/categories", get(catalog::categories))
        .route("/api/brands", get(catalog::brands))
        .nest("/api/auth", auth_routes())
        .nest("/api/user", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/payment", payment_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/store-requests", store_request_routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::state::test_state;

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = routes().with_state(test_state());
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_page_params() {
        assert_eq!(PageParams { page: None }.window(10).unwrap(), (1, 10, 0));
        assert_eq!(PageParams { page: Some(3) }.window(10).unwrap(), (3, 10, 20));
        assert!(PageParams { page: Some(0) }.page().is_err());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(get("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn test_protected_routes_require_login() {
        for uri in [
            "/api/auth/me",
            "/api/user/profile",
            "/api/user/addresses",
            "/api/cart",
            "/api/orders",
            "/api/store-requests/mine",
        ] {
            let (status, body) = send(get(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "Please log in to continue");
        }
    }

    #[tokio::test]
    async fn test_review_requires_login() {
        let (status, _) = send(post_json(
            "/api/products/muslin-swaddle/reviews",
            r#"{"rating":5,"body":"Lovely"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_product_filters_rejected() {
        let (status, body) = send(get("/api/products?min_price=900&max_price=100")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "min_price cannot be greater than max_price");

        let (status, _) = send(get("/api/products?per_page=49")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(get("/api/products?sort=cheapest")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_disabled_without_secret() {
        let (status, _) = send(post_json("/api/payment/webhook", r#"{"event":"order.paid"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
