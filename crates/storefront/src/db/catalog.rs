//! Catalog repository: categories, brands and products.

use sqlx::{PgPool, Postgres, QueryBuilder};

use cradlix_core::ProductId;

use super::RepositoryError;
use crate::models::{Brand, Category, ProductDetail, ProductImage, ProductQuery, ProductSummary};

const SUMMARY_SELECT: &str = "SELECT p.id, p.slug, p.name, p.price, p.mrp, p.stock > 0 AS in_stock,
       (SELECT i.url FROM cradlix.product_image i
        WHERE i.product_id = p.id ORDER BY i.position, i.id LIMIT 1) AS image_url,
       c.slug AS category_slug, b.name AS brand_name,
       r.average_rating, r.review_count, p.created_at";

/// Joins shared by listing, counting and detail queries.
const PRODUCT_FROM: &str = " FROM cradlix.product p
     LEFT JOIN cradlix.category c ON c.id = p.category_id
     LEFT JOIN cradlix.brand b ON b.id = p.brand_id
     LEFT JOIN LATERAL (
         SELECT ROUND(AVG(rv.rating), 1) AS average_rating, COUNT(*) AS review_count
         FROM cradlix.review rv WHERE rv.product_id = p.id
     ) r ON TRUE
     WHERE p.is_active";

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, slug, name, description, image_url, position
             FROM cradlix.category ORDER BY position, name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// All brands, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, Brand>(
            "SELECT id, slug, name, logo_url, description, is_featured
             FROM cradlix.brand ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// One page of active products plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<ProductSummary>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(PRODUCT_FROM);
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut list = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        list.push(PRODUCT_FROM);
        push_filters(&mut list, query);
        list.push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(i64::from(query.per_page))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = list
            .build_query_as::<ProductSummary>()
            .fetch_all(self.pool)
            .await?;
        Ok((items, total))
    }

    /// An active product with its images, by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductDetail>(&format!(
            "SELECT p.id, p.slug, p.name, p.description, p.price, p.mrp, p.stock,
                    c.id AS category_id, c.slug AS category_slug, c.name AS category_name,
                    b.id AS brand_id, b.slug AS brand_slug, b.name AS brand_name,
                    r.average_rating, r.review_count
             {PRODUCT_FROM} AND p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(mut product) = product else {
            return Ok(None);
        };
        product.images = self.images(product.id).await?;
        Ok(Some(product))
    }

    /// Images for a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductImage>(
            "SELECT url, alt_text, position FROM cradlix.product_image
             WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Resolve an active product's id from its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_product_id(&self, slug: &str) -> Result<Option<ProductId>, RepositoryError> {
        let id = sqlx::query_scalar(
            "SELECT id FROM cradlix.product WHERE slug = $1 AND is_active",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }

    /// Current stock of an active product, `None` if it is unknown or inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_stock(&self, id: ProductId) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar(
            "SELECT stock FROM cradlix.product WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(stock)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(category) = &query.category {
        qb.push(" AND c.slug = ").push_bind(category.clone());
    }
    if let Some(brand) = &query.brand {
        qb.push(" AND b.slug = ").push_bind(brand.clone());
    }
    if let Some(search) = &query.search {
        qb.push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
    if let Some(min) = query.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
    if query.in_stock_only {
        qb.push(" AND p.stock > 0");
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("organic"), "organic");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
