//! Database operations for the Cradlix `PostgreSQL` database.
//!
//! ## Tables (schema `cradlix`)
//!
//! - `user`, `address` - accounts and shipping addresses
//! - `category`, `brand`, `product`, `product_image` - catalog
//! - `review`, `cart_item` - per-user product data
//! - `customer_order`, `order_item` - orders with frozen line items
//! - `payment_event` - Razorpay callbacks and webhook log
//! - `banner`, `testimonial`, `store_request` - back-office managed content
//!
//! Sessions live in `storefront.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cradlix-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;
pub mod payment_events;
pub mod reviews;
pub mod store_requests;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use content::ContentRepository;
pub use orders::OrderRepository;
pub use payment_events::PaymentEventRepository;
pub use reviews::ReviewRepository;
pub use store_requests::StoreRequestRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
