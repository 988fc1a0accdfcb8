//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/admin/auth/login                      - Log in (rate limited)
//! POST   /api/admin/auth/logout                     - Log out
//! GET    /api/admin/auth/me                         - Session admin
//!
//! # Everything below requires an admin session
//! GET    /api/admin/dashboard                       - Order and queue figures
//!
//! GET    /api/admin/banners                         - All banners
//! POST   /api/admin/banners                         - Create
//! GET    /api/admin/banners/{id}                    - One banner
//! PUT    /api/admin/banners/{id}                    - Replace
//! DELETE /api/admin/banners/{id}                    - Delete
//!
//! GET|POST /api/admin/brands, GET|PUT|DELETE /api/admin/brands/{id}
//! GET|POST /api/admin/testimonials, GET|PUT|DELETE /api/admin/testimonials/{id}
//!
//! GET    /api/admin/store-requests?status=&page=    - Review queue
//! GET    /api/admin/store-requests/{id}             - One request
//! POST   /api/admin/store-requests/{id}/approve     - Approve {note?}
//! POST   /api/admin/store-requests/{id}/reject      - Reject {note}
//!
//! GET    /api/admin/orders?status=&page=            - Orders
//! GET    /api/admin/orders/{id}                     - Order detail
//! POST   /api/admin/orders/{id}/status              - Change status {status}
//! ```

pub mod auth;
pub mod banners;
pub mod brands;
pub mod dashboard;
pub mod orders;
pub mod store_requests;
pub mod testimonials;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// `?page=` for list endpoints with a fixed page size.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

impl PageParams {
    /// `(page, limit, offset)` for a page of `per_page` rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for page 0.
    pub fn window(self, per_page: u32) -> Result<(u32, i64, i64), AppError> {
        let page = match self.page {
            Some(0) => return Err(AppError::BadRequest("page must be at least 1".to_string())),
            Some(page) => page,
            None => 1,
        };
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

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter())
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::index).post(banners::create))
        .route(
            "/{id}",
            get(banners::show).put(banners::update).delete(banners::delete),
        )
}

fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(brands::index).post(brands::create))
        .route(
            "/{id}",
            get(brands::show).put(brands::update).delete(brands::delete),
        )
}

fn testimonial_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(testimonials::index).post(testimonials::create))
        .route(
            "/{id}",
            get(testimonials::show)
                .put(testimonials::update)
                .delete(testimonials::delete),
        )
}

fn store_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store_requests::index))
        .route("/{id}", get(store_requests::show))
        .route("/{id}/approve", post(store_requests::approve))
        .route("/{id}/reject", post(store_requests::reject))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::set_status))
}

/// Create all back-office routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .route("/dashboard", get(dashboard::show))
        .nest("/banners", banner_routes())
        .nest("/brands", brand_routes())
        .nest("/testimonials", testimonial_routes())
        .nest("/store-requests", store_request_routes())
        .nest("/orders", order_routes());

    Router::new()
        .nest("/api/admin", api)
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

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    #[test]
    fn test_page_params() {
        assert_eq!(PageParams { page: None }.window(20).unwrap(), (1, 20, 0));
        assert_eq!(PageParams { page: Some(4) }.window(20).unwrap(), (4, 20, 60));
        assert!(PageParams { page: Some(0) }.window(20).is_err());
    }

    #[test]
    fn test_or_not_found_names_resource() {
        let err = or_not_found("Brand")(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Brand not found"));
        let err = or_not_found("Brand")(RepositoryError::Conflict("taken".to_string()));
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(request("GET", "/api/admin/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn test_every_admin_route_requires_login() {
        for (method, uri) in [
            ("GET", "/api/admin/auth/me"),
            ("GET", "/api/admin/dashboard"),
            ("GET", "/api/admin/banners"),
            ("POST", "/api/admin/banners"),
            ("PUT", "/api/admin/banners/1"),
            ("DELETE", "/api/admin/banners/1"),
            ("GET", "/api/admin/brands/1"),
            ("DELETE", "/api/admin/brands/1"),
            ("POST", "/api/admin/testimonials"),
            ("GET", "/api/admin/store-requests?status=pending"),
            ("POST", "/api/admin/store-requests/3/approve"),
            ("POST", "/api/admin/store-requests/3/reject"),
            ("GET", "/api/admin/orders"),
            ("POST", "/api/admin/orders/9/status"),
        ] {
            let (status, body) = send(request(method, uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"], "Admin login required");
        }
    }
}
