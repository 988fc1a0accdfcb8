//! Testimonial repository.

use sqlx::PgPool;

use cradlix_core::TestimonialId;

use super::RepositoryError;
use crate::models::{Testimonial, TestimonialInput};

const TESTIMONIAL_COLUMNS: &str = "id, author_name, author_location, quote, rating, avatar_url, \
                                   is_published, created_at, updated_at";

pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, Testimonial>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM cradlix.testimonial
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such testimonial.
    pub async fn get(&self, id: TestimonialId) -> Result<Testimonial, RepositoryError> {
        sqlx::query_as::<_, Testimonial>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM cradlix.testimonial WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &TestimonialInput) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, Testimonial>(&format!(
            "INSERT INTO cradlix.testimonial
                (author_name, author_location, quote, rating, avatar_url, is_published)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TESTIMONIAL_COLUMNS}"
        ))
        .bind(&input.author_name)
        .bind(&input.author_location)
        .bind(&input.quote)
        .bind(input.rating)
        .bind(&input.avatar_url)
        .bind(input.is_published)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such testimonial.
    pub async fn update(
        &self,
        id: TestimonialId,
        input: &TestimonialInput,
    ) -> Result<Testimonial, RepositoryError> {
        sqlx::query_as::<_, Testimonial>(&format!(
            "UPDATE cradlix.testimonial
             SET author_name = $2, author_location = $3, quote = $4, rating = $5,
                 avatar_url = $6, is_published = $7, updated_at = now()
             WHERE id = $1
             RETURNING {TESTIMONIAL_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.author_name)
        .bind(&input.author_location)
        .bind(&input.quote)
        .bind(input.rating)
        .bind(&input.avatar_url)
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such testimonial.
    pub async fn delete(&self, id: TestimonialId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM cradlix.testimonial WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
