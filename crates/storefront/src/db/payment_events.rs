//! Payment event log.
//!
//! Every Razorpay callback, failure report and webhook is kept verbatim for
//! reconciliation.

use sqlx::PgPool;

use cradlix_core::OrderId;

use super::RepositoryError;

/// A gateway event to record.
#[derive(Debug, Clone)]
pub struct PaymentEvent<'a> {
    pub event: &'a str,
    pub order_id: Option<OrderId>,
    pub razorpay_order_id: Option<&'a str>,
    pub razorpay_payment_id: Option<&'a str>,
    pub payload: serde_json::Value,
}

/// Repository for `cradlix.payment_event`.
pub struct PaymentEventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentEventRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, event: PaymentEvent<'_>) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cradlix.payment_event
                (event, order_id, razorpay_order_id, razorpay_payment_id, payload)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.event)
        .bind(event.order_id)
        .bind(event.razorpay_order_id)
        .bind(event.razorpay_payment_id)
        .bind(sqlx::types::Json(event.payload))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
