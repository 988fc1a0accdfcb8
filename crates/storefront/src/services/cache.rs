//! In-memory cache for slow-changing catalog reads.
//!
//! Categories, brands and home content change only through the back office,
//! so they are cached for 5 minutes with `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{CatalogRepository, ContentRepository, RepositoryError};
use crate::models::{Brand, Category, HomeContent};

const TTL: Duration = Duration::from_secs(300);

/// Cache key.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Brands,
    Home,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Brands(Arc<Vec<Brand>>),
    Home(Arc<HomeContent>),
}

/// Read-through cache in front of the catalog and content repositories.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(16).time_to_live(TTL).build(),
        }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on a cache miss whose load fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CatalogRepository::new(pool).categories().await?);
        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    /// All brands.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on a cache miss whose load fails.
    pub async fn brands(&self, pool: &PgPool) -> Result<Arc<Vec<Brand>>, RepositoryError> {
        if let Some(CacheValue::Brands(brands)) = self.cache.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let brands = Arc::new(CatalogRepository::new(pool).brands().await?);
        self.cache
            .insert(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;
        Ok(brands)
    }

    /// Home page banners, featured brands and testimonials.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on a cache miss whose load fails.
    pub async fn home(&self, pool: &PgPool) -> Result<Arc<HomeContent>, RepositoryError> {
        if let Some(CacheValue::Home(home)) = self.cache.get(&CacheKey::Home).await {
            debug!("Cache hit for home content");
            return Ok(home);
        }

        let content = ContentRepository::new(pool);
        let (banners, brands, testimonials) = tokio::try_join!(
            content.active_banners(),
            content.featured_brands(),
            content.published_testimonials(),
        )?;
        let home = Arc::new(HomeContent {
            banners,
            brands,
            testimonials,
        });
        self.cache
            .insert(CacheKey::Home, CacheValue::Home(Arc::clone(&home)))
            .await;
        Ok(home)
    }
}
