//! Banner repository.

use sqlx::PgPool;

use cradlix_core::BannerId;

use super::RepositoryError;
use crate::models::{Banner, BannerInput};

const BANNER_COLUMNS: &str =
    "id, title, subtitle, image_url, link_url, position, is_active, created_at, updated_at";

/// Repository for home page banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every banner, by position then id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM cradlix.banner ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such banner.
    pub async fn get(&self, id: BannerId) -> Result<Banner, RepositoryError> {
        sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM cradlix.banner WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            "INSERT INTO cradlix.banner (title, subtitle, image_url, link_url, position, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;
        Ok(banner)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such banner.
    pub async fn update(&self, id: BannerId, input: &BannerInput) -> Result<Banner, RepositoryError> {
        sqlx::query_as::<_, Banner>(&format!(
            "UPDATE cradlix.banner
             SET title = $2, subtitle = $3, image_url = $4, link_url = $5,
                 position = $6, is_active = $7, updated_at = now()
             WHERE id = $1
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such banner.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cradlix.banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
