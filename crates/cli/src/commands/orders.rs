//! Order maintenance.
//!
//! Online orders reserve stock when they are created. `expire` cancels the
//! ones whose payment never arrived so the units go back on sale. Run it
//! from cron every few minutes.

use thiserror::Error;

use cradlix_admin::db::{OrderRepository, RepositoryError};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cancel `pending_payment` orders older than `older_than_minutes`.
pub async fn expire(older_than_minutes: i32) -> Result<(), OrdersError> {
    let pool = connect().await?;
    let expired = OrderRepository::new(&pool)
        .expire_stale(older_than_minutes)
        .await?;

    if expired.is_empty() {
        tracing::info!(older_than_minutes, "No stale orders");
    } else {
        let ids: Vec<String> = expired.iter().map(ToString::to_string).collect();
        tracing::info!(
            count = expired.len(),
            order_ids = %ids.join(","),
            "Expired stale orders and released stock"
        );
    }
    Ok(())
}
