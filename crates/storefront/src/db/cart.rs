//! Cart repository.

use sqlx::{PgConnection, PgPool};

use cradlix_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

/// Repository for per-user cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Cart lines joined with current product data, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLine>(
            "SELECT ci.product_id, p.slug, p.name,
                    (SELECT i.url FROM cradlix.product_image i
                     WHERE i.product_id = p.id ORDER BY i.position, i.id LIMIT 1) AS image_url,
                    p.price AS unit_price, ci.quantity, p.stock, p.is_active
             FROM cradlix.cart_item ci
             JOIN cradlix.product p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.added_at, ci.product_id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<i32>, RepositoryError> {
        let quantity = sqlx::query_scalar(
            "SELECT quantity FROM cradlix.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity)
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// Returns the new line quantity, or `None` when the merged quantity
    /// would exceed `limit` (nothing is changed in that case).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        limit: i32,
    ) -> Result<Option<i32>, RepositoryError> {
        let merged = sqlx::query_scalar(
            "INSERT INTO cradlix.cart_item (user_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id) DO UPDATE
                 SET quantity = cart_item.quantity + EXCLUDED.quantity, updated_at = now()
                 WHERE cart_item.quantity + EXCLUDED.quantity <= $4
             RETURNING quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(limit)
        .fetch_optional(self.pool)
        .await?;
        Ok(merged)
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cradlix.cart_item SET quantity = $3, updated_at = now()
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM cradlix.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear_cart(&mut conn, user_id).await
    }
}

/// Empty a user's cart on an existing connection or transaction.
pub(crate) async fn clear_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cradlix.cart_item WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
