//! Review repository.

use sqlx::PgPool;

use cradlix_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewInput};

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of a product's reviews, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        product_id: ProductId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cradlix.review WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(self.pool)
                .await?;

        let reviews = sqlx::query_as::<_, Review>(
            "SELECT r.id, r.rating, r.title, r.body, u.name AS author_name, r.created_at
             FROM cradlix.review r
             JOIN cradlix.user u ON u.id = r.user_id
             WHERE r.product_id = $1
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((reviews, total))
    }

    /// Post a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            "WITH inserted AS (
                 INSERT INTO cradlix.review (product_id, user_id, rating, title, body)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, user_id, rating, title, body, created_at
             )
             SELECT i.id, i.rating, i.title, i.body, u.name AS author_name, i.created_at
             FROM inserted i JOIN cradlix.user u ON u.id = i.user_id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(input.rating)
        .bind(&input.title)
        .bind(&input.body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "you have already reviewed this product"))
    }
}
