//! Dashboard figures.

use serde::Serialize;

use cradlix_core::{Money, OrderStatus};

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// `GET /api/admin/dashboard` body.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// One entry per status, in lifecycle order, zeros included.
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of totals of paid, processing, shipped and delivered orders.
    pub paid_revenue: Money,
    pub pending_store_requests: i64,
    pub active_products: i64,
    pub customers: i64,
}

/// Expand sparse `GROUP BY` rows into a count for every status.
#[must_use]
pub fn status_counts(rows: &[(OrderStatus, i64)]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, count)| *count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_fill_gaps() {
        let counts = status_counts(&[(OrderStatus::Shipped, 4), (OrderStatus::PendingPayment, 2)]);
        assert_eq!(counts.len(), OrderStatus::ALL.len());
        assert_eq!(
            counts.first(),
            Some(&StatusCount {
                status: OrderStatus::PendingPayment,
                count: 2
            })
        );
        let shipped = counts.iter().find(|c| c.status == OrderStatus::Shipped);
        assert_eq!(shipped.map(|c| c.count), Some(4));
        let paid = counts.iter().find(|c| c.status == OrderStatus::Paid);
        assert_eq!(paid.map(|c| c.count), Some(0));
    }
}
