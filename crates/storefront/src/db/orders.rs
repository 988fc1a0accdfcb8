//! Order repository.
//!
//! Placing an order re-prices the cart from current product rows and
//! reserves stock with conditional decrements, all inside one transaction.
//! A user has at most one unpaid order: placing a new one cancels any
//! earlier `pending_payment` order first and returns its units, so retrying
//! checkout on the same cart never reserves stock twice. Cancelling returns
//! the reserved units.

use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use cradlix_core::{Money, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use super::cart::clear_cart;
use crate::models::{AddressSnapshot, Order, OrderItem, OrderSummary};
use crate::services::checkout::Pricing;

const ORDER_COLUMNS: &str = "id, user_id, status, payment_method, subtotal, shipping_fee, total, \
                             currency, receipt, shipping_address, razorpay_order_id, \
                             razorpay_payment_id, paid_at, cancelled_at, created_at";

const ITEM_COLUMNS: &str =
    "id, product_id, product_name, product_slug, unit_price, quantity, line_total";

/// Random suffix length for receipts.
const RECEIPT_SUFFIX_LEN: usize = 8;

/// Cart line as read inside the order transaction.
#[derive(sqlx::FromRow)]
struct PricedLine {
    product_id: ProductId,
    name: String,
    slug: String,
    price: Money,
    quantity: i32,
    is_active: bool,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order.
    ///
    /// Razorpay orders start `pending_payment` and keep the cart until the
    /// payment is verified. Cash-on-delivery orders start `processing` and
    /// clear the cart immediately. Earlier unpaid orders of the user are
    /// cancelled and their stock released before anything is reserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` naming the product when a line is
    /// unavailable or short of stock; nothing is committed in that case.
    pub async fn create(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        shipping_address: &AddressSnapshot,
        pricing: &Pricing,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Orders before cart rows, the same lock order as `mark_paid`.
        let superseded = cancel_unpaid(&mut tx, user_id).await?;

        let lines = sqlx::query_as::<_, PricedLine>(
            "SELECT ci.product_id, p.name, p.slug, p.price, ci.quantity, p.is_active
             FROM cradlix.cart_item ci
             JOIN cradlix.product p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.product_id
             FOR UPDATE OF ci",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(RepositoryError::Conflict("your cart is empty".to_owned()));
        }
        if !superseded.is_empty() {
            info!(user_id = %user_id, ?superseded, "Cancelling earlier unpaid orders");
        }

        for line in &lines {
            if !line.is_active {
                return Err(RepositoryError::Conflict(format!(
                    "{} is no longer available",
                    line.name
                )));
            }
            let reserved = sqlx::query(
                "UPDATE cradlix.product SET stock = stock - $2, updated_at = now()
                 WHERE id = $1 AND is_active AND stock >= $2",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            if reserved.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "not enough stock for {}",
                    line.name
                )));
            }
        }

        let subtotal: Money = lines
            .iter()
            .map(|l| l.price * l.quantity.unsigned_abs())
            .sum();
        let totals = pricing.totals(subtotal);
        let status = match payment_method {
            PaymentMethod::Razorpay => OrderStatus::PendingPayment,
            PaymentMethod::CashOnDelivery => OrderStatus::Processing,
        };

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO cradlix.customer_order
                (user_id, status, payment_method, subtotal, shipping_fee, total, currency, shipping_address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(user_id)
        .bind(status)
        .bind(payment_method)
        .bind(totals.subtotal)
        .bind(totals.shipping_fee)
        .bind(totals.total)
        .bind(Money::CURRENCY)
        .bind(Json(shipping_address))
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO cradlix.order_item
                    (order_id, product_id, product_name, product_slug, unit_price, quantity, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(&line.slug)
            .bind(line.price)
            .bind(line.quantity)
            .bind(line.price * line.quantity.unsigned_abs())
            .execute(&mut *tx)
            .await?;
        }

        let mut order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE cradlix.customer_order SET receipt = $2 WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(receipt(order_id))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "receipt collision"))?;

        if payment_method == PaymentMethod::CashOnDelivery {
            clear_cart(&mut tx, user_id).await?;
        }

        order.items = items(&mut tx, order_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Attach the gateway order id after Razorpay accepted the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_razorpay_order_id(
        &self,
        id: OrderId,
        razorpay_order_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cradlix.customer_order SET razorpay_order_id = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(razorpay_order_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "razorpay order already linked"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Look an order up by its Razorpay order id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_razorpay_order_id(
        &self,
        razorpay_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM cradlix.customer_order WHERE razorpay_order_id = $1"
        ))
        .bind(razorpay_order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Record a captured payment.
    ///
    /// Idempotent: an order that is already paid (or further along) is
    /// returned unchanged. The owner's cart is cleared on the first transition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order was cancelled.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        razorpay_payment_id: &str,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, id).await?;

        match order.status {
            OrderStatus::Cancelled => {
                return Err(RepositoryError::Conflict(
                    "this order has been cancelled".to_owned(),
                ));
            }
            OrderStatus::PendingPayment => {
                order = sqlx::query_as::<_, Order>(&format!(
                    "UPDATE cradlix.customer_order
                     SET status = 'paid', razorpay_payment_id = $2, paid_at = now(), updated_at = now()
                     WHERE id = $1
                     RETURNING {ORDER_COLUMNS}"
                ))
                .bind(id)
                .bind(razorpay_payment_id)
                .fetch_one(&mut *tx)
                .await?;
                clear_cart(&mut tx, order.user_id).await?;
            }
            _ => {}
        }

        order.items = items(&mut tx, id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Cancel an order whose current status is one of `allowed`, returning
    /// its reserved stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the status no longer allows it.
    pub async fn cancel(
        &self,
        id: OrderId,
        allowed: &[OrderStatus],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order = lock_order(&mut tx, id).await?;

        if !allowed.contains(&order.status) {
            return Err(RepositoryError::Conflict(format!(
                "an order that is {} cannot be cancelled",
                order.status.as_str().replace('_', " ")
            )));
        }

        release_stock(&mut tx, &[id.as_i64()]).await?;

        let mut order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE cradlix.customer_order
             SET status = 'cancelled', cancelled_at = now(), updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        order.items = items(&mut tx, id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// A page of the user's orders, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cradlix.customer_order WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        let orders = sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id, o.status, o.payment_method, o.total,
                    COALESCE((SELECT SUM(oi.quantity) FROM cradlix.order_item oi
                              WHERE oi.order_id = o.id), 0)::BIGINT AS item_count,
                    o.created_at
             FROM cradlix.customer_order o
             WHERE o.user_id = $1
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// One of the user's orders with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM cradlix.customer_order WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };
        let mut conn = self.pool.acquire().await?;
        order.items = items(&mut conn, id).await?;
        Ok(Some(order))
    }
}

/// Cancel the user's `pending_payment` orders and return their units.
///
/// Each one is logged as an `order.superseded` payment event for matching
/// against late captures.
async fn cancel_unpaid(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<i64>, RepositoryError> {
    let unpaid: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM cradlix.customer_order
         WHERE user_id = $1 AND status = 'pending_payment'
         ORDER BY id
         FOR UPDATE",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    if unpaid.is_empty() {
        return Ok(unpaid);
    }

    release_stock(conn, &unpaid).await?;
    sqlx::query(
        "UPDATE cradlix.customer_order
         SET status = 'cancelled', cancelled_at = now(), updated_at = now()
         WHERE id = ANY($1)",
    )
    .bind(&unpaid)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO cradlix.payment_event (event, order_id, razorpay_order_id, payload)
         SELECT 'order.superseded', id, razorpay_order_id, jsonb_build_object('total', total)
         FROM cradlix.customer_order
         WHERE id = ANY($1)",
    )
    .bind(&unpaid)
    .execute(&mut *conn)
    .await?;
    Ok(unpaid)
}

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

async fn lock_order(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM cradlix.customer_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn items(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cradlix.order_item WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Gateway receipt: `cradlix_<order id>_<random>`, at most 40 characters.
fn receipt(order_id: OrderId) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RECEIPT_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("cradlix_{order_id}_{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;
    use crate::db::fixtures;

    #[test]
    fn test_receipt_format() {
        let receipt = receipt(OrderId::new(4521));
        assert!(receipt.starts_with("cradlix_4521_"));
        assert_eq!(receipt.len(), "cradlix_4521_".len() + RECEIPT_SUFFIX_LEN);
        assert!(receipt.len() <= 40);
        let max = super::receipt(OrderId::new(i64::MAX));
        assert!(max.len() <= 40);
    }

    async fn statuses(pool: &PgPool, user_id: UserId) -> Vec<OrderStatus> {
        sqlx::query_scalar("SELECT status FROM cradlix.customer_order WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_retried_checkout_reserves_stock_once(pool: PgPool) {
        let user = fixtures::customer(&pool, "retry@cradlix.test").await;
        let product = fixtures::product(&pool, "swaddle-set", Money::from_rupees(650), 4).await;
        fixtures::add_to_cart(&pool, user.id, product, 2).await;
        let pricing = Pricing::from(CheckoutConfig::default());
        let repo = OrderRepository::new(&pool);

        for _ in 0..3 {
            let order = repo
                .create(user.id, PaymentMethod::Razorpay, &fixtures::snapshot(), &pricing)
                .await
                .unwrap();
            assert_eq!(order.status, OrderStatus::PendingPayment);
            assert_eq!(fixtures::stock(&pool, product).await, 2);
        }

        assert_eq!(
            statuses(&pool, user.id).await,
            vec![
                OrderStatus::Cancelled,
                OrderStatus::Cancelled,
                OrderStatus::PendingPayment
            ]
        );
        assert_eq!(fixtures::cart_lines(&pool, user.id).await, 1);
        assert_eq!(fixtures::payment_events(&pool, "order.superseded").await, 2);
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_failed_retry_keeps_the_earlier_order(pool: PgPool) {
        let user = fixtures::customer(&pool, "short@cradlix.test").await;
        let product = fixtures::product(&pool, "bath-tub", Money::from_rupees(1200), 2).await;
        fixtures::add_to_cart(&pool, user.id, product, 2).await;
        let pricing = Pricing::from(CheckoutConfig::default());
        let repo = OrderRepository::new(&pool);

        repo.create(user.id, PaymentMethod::Razorpay, &fixtures::snapshot(), &pricing)
            .await
            .unwrap();
        sqlx::query("UPDATE cradlix.cart_item SET quantity = 5 WHERE user_id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = repo
            .create(user.id, PaymentMethod::Razorpay, &fixtures::snapshot(), &pricing)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(statuses(&pool, user.id).await, vec![OrderStatus::PendingPayment]);
        assert_eq!(fixtures::stock(&pool, product).await, 0);
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_cod_after_unpaid_order_releases_it(pool: PgPool) {
        let user = fixtures::customer(&pool, "switch@cradlix.test").await;
        let product = fixtures::product(&pool, "teether", Money::from_rupees(199), 3).await;
        fixtures::add_to_cart(&pool, user.id, product, 3).await;
        let pricing = Pricing::from(CheckoutConfig::default());
        let repo = OrderRepository::new(&pool);

        repo.create(user.id, PaymentMethod::Razorpay, &fixtures::snapshot(), &pricing)
            .await
            .unwrap();
        let cod = repo
            .create(user.id, PaymentMethod::CashOnDelivery, &fixtures::snapshot(), &pricing)
            .await
            .unwrap();

        assert_eq!(cod.status, OrderStatus::Processing);
        assert_eq!(fixtures::stock(&pool, product).await, 0);
        assert_eq!(fixtures::cart_lines(&pool, user.id).await, 0);
        assert_eq!(
            statuses(&pool, user.id).await,
            vec![OrderStatus::Cancelled, OrderStatus::Processing]
        );
    }
}
