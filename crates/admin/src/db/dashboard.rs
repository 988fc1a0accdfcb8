//! Back-office dashboard figures.

use sqlx::PgPool;

use cradlix_core::{Money, OrderStatus};

use super::RepositoryError;
use crate::models::Dashboard;
use crate::models::dashboard::status_counts;

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self) -> Result<Dashboard, RepositoryError> {
        let by_status: Vec<(OrderStatus, i64, Money)> = sqlx::query_as(
            "SELECT status, COUNT(*), COALESCE(SUM(total), 0)
             FROM cradlix.customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let paid_revenue: Money = by_status
            .iter()
            .filter(|(status, _, _)| status.counts_as_revenue())
            .map(|(_, _, total)| *total)
            .sum();
        let counts: Vec<(OrderStatus, i64)> = by_status
            .iter()
            .map(|(status, count, _)| (*status, *count))
            .collect();

        let (pending_store_requests, active_products, customers): (i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    (SELECT COUNT(*) FROM cradlix.store_request WHERE status = 'pending'),
                    (SELECT COUNT(*) FROM cradlix.product WHERE is_active),
                    (SELECT COUNT(*) FROM cradlix.user WHERE role = 'customer')",
            )
            .fetch_one(self.pool)
            .await?;

        Ok(Dashboard {
            orders_by_status: status_counts(&counts),
            paid_revenue,
            pending_store_requests,
            active_products,
            customers,
        })
    }
}
