//! Order management.
//!
//! Status changes follow [`OrderStatus::can_transition_to`]. Moving an order
//! to `cancelled` returns its units to stock in the same transaction, and
//! [`OrderRepository::expire_stale`] does the same for abandoned online
//! payments.

use sqlx::{PgConnection, PgPool};

use cradlix_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderSummary};

const ORDER_SELECT: &str = "SELECT o.id, o.user_id, u.name AS customer_name,
        u.email AS customer_email, o.status, o.payment_method, o.subtotal, o.shipping_fee,
        o.total, o.currency, o.receipt, o.shipping_address, o.razorpay_order_id,
        o.razorpay_payment_id, o.paid_at, o.cancelled_at, o.created_at, o.updated_at
     FROM cradlix.customer_order o
     JOIN cradlix.user u ON u.id = o.user_id";

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of orders, newest first, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cradlix.customer_order
             WHERE $1::cradlix.order_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let orders = sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id, o.user_id, u.email AS customer_email, o.status, o.payment_method,
                    o.total,
                    COALESCE((SELECT SUM(oi.quantity) FROM cradlix.order_item oi
                              WHERE oi.order_id = o.id), 0)::BIGINT AS item_count,
                    o.created_at
             FROM cradlix.customer_order o
             JOIN cradlix.user u ON u.id = o.user_id
             WHERE $1::cradlix.order_status IS NULL OR o.status = $1
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such order.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let mut order = fetch(&mut conn, id, false).await?;
        order.items = items(&mut conn, id).await?;
        Ok(order)
    }

    /// Move an order to `next`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such order, or
    /// `RepositoryError::Conflict` if the lifecycle does not allow the move.
    pub async fn set_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut tx, id, true).await?.status;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "an order cannot move from {current} to {next}"
            )));
        }

        if current.holds_stock() && !next.holds_stock() {
            release_stock(&mut tx, &[id.as_i64()]).await?;
        }

        sqlx::query(
            "UPDATE cradlix.customer_order
             SET status = $2,
                 paid_at = CASE WHEN $2 = 'paid' THEN COALESCE(paid_at, now()) ELSE paid_at END,
                 cancelled_at = CASE WHEN $2 = 'cancelled' THEN now() ELSE cancelled_at END,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        let mut order = fetch(&mut tx, id, false).await?;
        order.items = items(&mut tx, id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Cancel `pending_payment` orders older than `older_than_minutes` and
    /// return their stock. Rows locked by a concurrent payment are skipped.
    ///
    /// Each expiry is logged as an `order.expired` payment event, so a
    /// capture that reaches Razorpay afterwards can be matched up and refunded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn expire_stale(&self, older_than_minutes: i32) -> Result<Vec<OrderId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stale: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM cradlix.customer_order
             WHERE status = 'pending_payment'
               AND created_at < now() - make_interval(mins => $1)
             ORDER BY id
             FOR UPDATE SKIP LOCKED",
        )
        .bind(older_than_minutes)
        .fetch_all(&mut *tx)
        .await?;

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        release_stock(&mut tx, &stale).await?;

        sqlx::query(
            "UPDATE cradlix.customer_order
             SET status = 'cancelled', cancelled_at = now(), updated_at = now()
             WHERE id = ANY($1)",
        )
        .bind(&stale)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO cradlix.payment_event (event, order_id, razorpay_order_id, payload)
             SELECT 'order.expired', id, razorpay_order_id,
                    jsonb_build_object('total', total, 'created_at', created_at)
             FROM cradlix.customer_order
             WHERE id = ANY($1)",
        )
        .bind(&stale)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stale.into_iter().map(OrderId::new).collect())
    }
}

/// Return the units of `order_ids` to their products.
async fn release_stock(conn: &mut PgConnection, order_ids: &[i64]) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE cradlix.product p
         SET stock = p.stock + released.quantity, updated_at = now()
         FROM (SELECT product_id, SUM(quantity)::INTEGER AS quantity
               FROM cradlix.order_item
               WHERE order_id = ANY($1) AND product_id IS NOT NULL
               GROUP BY product_id) released
         WHERE p.id = released.product_id",
    )
    .bind(order_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch(conn: &mut PgConnection, id: OrderId, lock: bool) -> Result<Order, RepositoryError> {
    let lock = if lock { " FOR UPDATE OF o" } else { "" };
    sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} WHERE o.id = $1{lock}"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}

async fn items(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, product_id, product_name, product_slug, unit_price, quantity, line_total
         FROM cradlix.order_item WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A customer with a Razorpay order for two units, placed `age` ago.
    async fn pending_order(pool: &PgPool, age: &str) -> (OrderId, i64) {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO cradlix.user (email, password_hash, name)
             VALUES ('late@cradlix.test', 'not-a-real-hash', 'Late Payer')
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO cradlix.product (slug, name, price, stock)
             VALUES ('feeding-bottle-' || md5(random()::text), 'Feeding Bottle', 299, 1)
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO cradlix.customer_order
                (user_id, status, payment_method, subtotal, shipping_fee, total,
                 shipping_address, razorpay_order_id, created_at)
             VALUES ($1, 'pending_payment', 'razorpay', 598, 0, 598, '{}'::jsonb,
                     'order_' || md5(random()::text), now() - $2::interval)
             RETURNING id",
        )
        .bind(user_id)
        .bind(age)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO cradlix.order_item
                (order_id, product_id, product_name, product_slug, unit_price, quantity, line_total)
             VALUES ($1, $2, 'Feeding Bottle', 'feeding-bottle', 299, 2, 598)",
        )
        .bind(order_id)
        .bind(product_id)
        .execute(pool)
        .await
        .unwrap();
        (order_id, product_id)
    }

    async fn stock(pool: &PgPool, product_id: i64) -> i32 {
        sqlx::query_scalar("SELECT stock FROM cradlix.product WHERE id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "../storefront/migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_expire_stale_releases_stock_and_logs_event(pool: PgPool) {
        let (stale, stale_product) = pending_order(&pool, "2 hours").await;
        let (fresh, fresh_product) = pending_order(&pool, "1 minute").await;

        let expired = OrderRepository::new(&pool).expire_stale(30).await.unwrap();
        assert_eq!(expired, vec![stale]);
        assert_eq!(stock(&pool, stale_product).await, 3);
        assert_eq!(stock(&pool, fresh_product).await, 1);

        let order = OrderRepository::new(&pool).get(stale).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.cancelled_at.is_some());

        let logged: Vec<(OrderId, Option<String>)> = sqlx::query_as(
            "SELECT order_id, razorpay_order_id FROM cradlix.payment_event
             WHERE event = 'order.expired'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let [(order_id, razorpay_order_id)] = logged.as_slice() else {
            panic!("expected one expiry event, got {}", logged.len());
        };
        assert_eq!(*order_id, stale);
        assert_ne!(*order_id, fresh);
        assert_eq!(*razorpay_order_id, order.razorpay_order_id);
    }

    #[sqlx::test(migrations = "../storefront/migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_expire_stale_with_nothing_to_do(pool: PgPool) {
        pending_order(&pool, "5 minutes").await;
        let expired = OrderRepository::new(&pool).expire_stale(30).await.unwrap();
        assert!(expired.is_empty());
    }
}
