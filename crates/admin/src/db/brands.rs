//! Brand repository.
//!
//! Slugs are unique; a clash surfaces as `RepositoryError::Conflict`.
//! Deleting a brand leaves its products in place with no brand
//! (`ON DELETE SET NULL`).

use sqlx::{PgConnection, PgPool};

use cradlix_core::BrandId;

use super::RepositoryError;
use crate::models::{Brand, BrandInput};

const SLUG_TAKEN: &str = "a brand with this slug already exists";

/// Reads include how many products point at the brand.
const BRAND_SELECT: &str = "SELECT b.id, b.slug, b.name, b.logo_url, b.description, b.is_featured,
        (SELECT COUNT(*) FROM cradlix.product p WHERE p.brand_id = b.id) AS product_count,
        b.created_at, b.updated_at
     FROM cradlix.brand b";

pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All brands, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, Brand>(&format!("{BRAND_SELECT} ORDER BY b.name, b.id"))
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such brand.
    pub async fn get(&self, id: BrandId) -> Result<Brand, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &BrandInput) -> Result<Brand, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id: BrandId = sqlx::query_scalar(
            "INSERT INTO cradlix.brand (slug, name, logo_url, description, is_featured)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.logo_url)
        .bind(&input.description)
        .bind(input.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, SLUG_TAKEN))?;

        let brand = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(brand)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such brand, or
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(&self, id: BrandId, input: &BrandInput) -> Result<Brand, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE cradlix.brand
             SET slug = $2, name = $3, logo_url = $4, description = $5, is_featured = $6,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.logo_url)
        .bind(&input.description)
        .bind(input.is_featured)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, SLUG_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        let brand = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(brand)
    }

    /// Delete a brand. Returns how many products were detached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such brand.
    pub async fn delete(&self, id: BrandId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let detached = sqlx::query(
            "UPDATE cradlix.product SET brand_id = NULL, updated_at = now() WHERE brand_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let result = sqlx::query("DELETE FROM cradlix.brand WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(detached)
    }
}

async fn fetch(conn: &mut PgConnection, id: BrandId) -> Result<Brand, RepositoryError> {
    sqlx::query_as::<_, Brand>(&format!("{BRAND_SELECT} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}
