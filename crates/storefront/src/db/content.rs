//! Home page content reads.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{Banner, Brand, Testimonial};

/// Home page shows at most this many testimonials.
const HOME_TESTIMONIALS: i64 = 12;

/// Repository for banners, featured brands and testimonials.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active banners by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_banners(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, Banner>(
            "SELECT id, title, subtitle, image_url, link_url, position
             FROM cradlix.banner WHERE is_active ORDER BY position, id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Featured brands, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, Brand>(
            "SELECT id, slug, name, logo_url, description, is_featured
             FROM cradlix.brand WHERE is_featured ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Published testimonials, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_testimonials(&self) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, Testimonial>(
            "SELECT id, author_name, author_location, quote, rating, avatar_url, created_at
             FROM cradlix.testimonial WHERE is_published
             ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(HOME_TESTIMONIALS)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
