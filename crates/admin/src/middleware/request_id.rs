//! Request ID middleware.
//!
//! An upstream `x-request-id` is kept only when it is a UUID; anything else
//! is replaced with a fresh UUID v4. The id is recorded on the tracing span
//! and the Sentry scope, and returned in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    async fn response_id(upstream: Option<&str>) -> String {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_id_middleware));

        let mut builder = Request::builder().uri("/");
        if let Some(id) = upstream {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_uuid_from_proxy_kept() {
        let upstream = "3f2b8c1e-9d4a-4f6b-8e2a-1c5d7f9a0b3e";
        assert_eq!(response_id(Some(upstream)).await, upstream);
    }

    #[tokio::test]
    async fn test_non_uuid_replaced() {
        let id = response_id(Some("<script>")).await;
        assert!(Uuid::parse_str(&id).is_ok());
        let id = response_id(None).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
