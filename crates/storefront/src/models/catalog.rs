//! Catalog models: categories, brands, products and listing queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cradlix_core::{BrandId, CategoryId, Money, ProductId};

use cradlix_core::validation::{ValidationError, optional_text};

/// Default page size for product listings.
pub const DEFAULT_PER_PAGE: u32 = 12;
/// Largest page a client may request.
pub const MAX_PER_PAGE: u32 = 48;

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub position: i32,
}

/// A brand.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: BrandId,
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
}

/// Product card data for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub in_stock: bool,
    pub image_url: Option<String>,
    pub category_slug: Option<String>,
    pub brand_name: Option<String>,
    pub average_rating: Option<Decimal>,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A product image.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

/// Full product page data.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductDetail {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
    #[sqlx(flatten)]
    pub category: CategoryRef,
    #[sqlx(flatten)]
    pub brand: BrandRef,
    pub average_rating: Option<Decimal>,
    pub review_count: i64,
    #[sqlx(skip)]
    pub images: Vec<ProductImage>,
}

/// Category fields joined onto a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRef {
    pub category_id: Option<CategoryId>,
    pub category_slug: Option<String>,
    pub category_name: Option<String>,
}

/// Brand fields joined onto a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BrandRef {
    pub brand_id: Option<BrandId>,
    pub brand_slug: Option<String>,
    pub brand_name: Option<String>,
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
    Rating,
}

impl ProductSort {
    /// `ORDER BY` clause. Every arm ends on `p.id` so pages are stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::Name => "p.name ASC, p.id ASC",
            Self::Rating => "average_rating DESC NULLS LAST, review_count DESC, p.id DESC",
        }
    }
}

/// Raw `GET /api/products` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub sort: Option<ProductSort>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Validated listing filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub in_stock_only: bool,
    pub sort: ProductSort,
    pub page: u32,
    pub per_page: u32,
}

impl ProductQuery {
    /// Rows to skip for the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

impl TryFrom<ProductListParams> for ProductQuery {
    type Error = ValidationError;

    fn try_from(p: ProductListParams) -> Result<Self, Self::Error> {
        let page = p.page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationError::new("page must be at least 1"));
        }
        let per_page = p.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(ValidationError::new(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        for (field, value) in [("min_price", p.min_price), ("max_price", p.max_price)] {
            if value.is_some_and(|v| v.is_sign_negative()) {
                return Err(ValidationError::new(format!("{field} cannot be negative")));
            }
        }
        if let (Some(min), Some(max)) = (p.min_price, p.max_price)
            && min > max
        {
            return Err(ValidationError::new(
                "min_price cannot be greater than max_price",
            ));
        }

        Ok(Self {
            category: optional_text("category", p.category.as_deref(), 120)?,
            brand: optional_text("brand", p.brand.as_deref(), 120)?,
            search: optional_text("q", p.q.as_deref(), 100)?,
            min_price: p.min_price.map(Money::new),
            max_price: p.max_price.map(Money::new),
            in_stock_only: p.in_stock.unwrap_or(false),
            sort: p.sort.unwrap_or_default(),
            page,
            per_page,
        })
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let per = i64::from(per_page.max(1));
        Self {
            items,
            page,
            per_page,
            total,
            total_pages: (total + per - 1) / per,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = ProductQuery::try_from(ProductListParams::default()).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, DEFAULT_PER_PAGE);
        assert_eq!(q.sort, ProductSort::Newest);
        assert!(!q.in_stock_only);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_page_zero_rejected() {
        let params = ProductListParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(ProductQuery::try_from(params).is_err());
    }

    #[test]
    fn test_per_page_bounds() {
        for bad in [0, 49] {
            let params = ProductListParams {
                per_page: Some(bad),
                ..Default::default()
            };
            assert!(ProductQuery::try_from(params).is_err(), "per_page {bad}");
        }
    }

    #[test]
    fn test_price_range_order() {
        let params = ProductListParams {
            min_price: Some(Decimal::from(500)),
            max_price: Some(Decimal::from(100)),
            ..Default::default()
        };
        let err = ProductQuery::try_from(params).unwrap_err();
        assert!(err.to_string().contains("min_price"));
    }

    #[test]
    fn test_blank_search_ignored() {
        let params = ProductListParams {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(ProductQuery::try_from(params).unwrap().search, None);
    }

    #[test]
    fn test_offset() {
        let params = ProductListParams {
            page: Some(3),
            per_page: Some(10),
            ..Default::default()
        };
        assert_eq!(ProductQuery::try_from(params).unwrap().offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(Page::<()>::new(vec![], 1, 12, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], 1, 12, 12).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 1, 12, 13).total_pages, 2);
    }

    #[test]
    fn test_sort_wire_names() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
    }
}
