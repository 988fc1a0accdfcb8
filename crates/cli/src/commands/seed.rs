//! Catalog seeding from YAML.
//!
//! Categories, brands and products are upserted by slug, so running the same
//! file twice changes nothing. A product's images are replaced by the list in
//! the file. Stock in the file overwrites stock in the database.
//!
//! ```yaml
//! categories:
//!   - slug: feeding
//!     name: Feeding
//! brands:
//!   - name: Little Leaf      # slug derived: little-leaf
//!     is_featured: true
//! products:
//!   - slug: steel-sipper-cup
//!     name: Steel Sipper Cup
//!     category: feeding
//!     brand: little-leaf
//!     price: "449.00"
//!     stock: 40
//!     images:
//!       - url: https://cdn.cradlix.in/p/sipper-1.jpg
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;
use thiserror::Error;
use tracing::{error, info};

use cradlix_admin::validation::{http_url, optional_http_url};
use cradlix_core::{BrandId, CategoryId, Money, Slug};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub brands: Vec<BrandSeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandSeed {
    pub slug: Option<String>,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Money,
    pub mrp: Option<Money>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSeed {
    pub url: String,
    pub alt_text: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// A brand's slug as given, or derived from its name.
fn brand_slug(brand: &BrandSeed) -> Result<Slug, String> {
    match &brand.slug {
        Some(slug) => Slug::parse(slug).map_err(|e| format!("brand {}: {e}", brand.name)),
        None => Slug::from_name(&brand.name).map_err(|e| format!("brand {}: {e}", brand.name)),
    }
}

/// Every problem in the file, so one run reports them all.
pub fn validate(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut categories = HashSet::new();
    for category in &file.categories {
        if let Err(e) = Slug::parse(&category.slug) {
            errors.push(format!("category {}: {e}", category.slug));
        }
        if category.name.trim().is_empty() {
            errors.push(format!("category {}: name is required", category.slug));
        }
        if let Err(e) = optional_http_url("image_url", category.image_url.as_deref()) {
            errors.push(format!("category {}: {e}", category.slug));
        }
        if !categories.insert(category.slug.as_str()) {
            errors.push(format!("category {} is listed twice", category.slug));
        }
    }

    let mut brands = HashSet::new();
    for brand in &file.brands {
        match brand_slug(brand) {
            Ok(slug) => {
                if !brands.insert(slug.as_str().to_owned()) {
                    errors.push(format!("brand {slug} is listed twice"));
                }
            }
            Err(e) => errors.push(e),
        }
        if let Err(e) = optional_http_url("logo_url", brand.logo_url.as_deref()) {
            errors.push(format!("brand {}: {e}", brand.name));
        }
    }

    let mut products = HashSet::new();
    for product in &file.products {
        let at = format!("product {}", product.slug);
        if let Err(e) = Slug::parse(&product.slug) {
            errors.push(format!("{at}: {e}"));
        }
        if !products.insert(product.slug.as_str()) {
            errors.push(format!("{at} is listed twice"));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("{at}: name is required"));
        }
        if let Some(category) = &product.category
            && !categories.contains(category.as_str())
        {
            errors.push(format!("{at}: unknown category {category}"));
        }
        if let Some(brand) = &product.brand
            && !brands.contains(brand)
        {
            errors.push(format!("{at}: unknown brand {brand}"));
        }
        if product.price.to_paise().is_err() {
            errors.push(format!("{at}: price must be a non-negative amount in paise precision"));
        }
        if let Some(mrp) = product.mrp
            && mrp < product.price
        {
            errors.push(format!("{at}: mrp cannot be below price"));
        }
        if product.stock < 0 {
            errors.push(format!("{at}: stock cannot be negative"));
        }
        for image in &product.images {
            if let Err(e) = http_url("image url", &image.url) {
                errors.push(format!("{at}: {e}"));
            }
        }
    }

    errors
}

/// Validate and load a catalog file in one transaction.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::NotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog");
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    // Validate before touching the database
    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut category_ids = HashMap::new();
    for category in &file.categories {
        let id = upsert_category(&mut tx, category).await?;
        category_ids.insert(category.slug.as_str(), id);
    }

    let mut brand_ids = HashMap::new();
    for brand in &file.brands {
        // validated above
        let Ok(slug) = brand_slug(brand) else { continue };
        let id = upsert_brand(&mut tx, &slug, brand).await?;
        brand_ids.insert(slug.as_str().to_owned(), id);
    }

    for product in &file.products {
        let category_id = product
            .category
            .as_deref()
            .and_then(|slug| category_ids.get(slug).copied());
        let brand_id = product
            .brand
            .as_deref()
            .and_then(|slug| brand_ids.get(slug).copied());
        upsert_product(&mut tx, product, category_id, brand_id).await?;
    }

    tx.commit().await?;

    info!(
        categories = file.categories.len(),
        brands = file.brands.len(),
        products = file.products.len(),
        "Catalog seeded"
    );
    Ok(())
}

async fn upsert_category(
    conn: &mut PgConnection,
    category: &CategorySeed,
) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO cradlix.category (slug, name, description, image_url, position)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (slug) DO UPDATE
         SET name = EXCLUDED.name, description = EXCLUDED.description,
             image_url = EXCLUDED.image_url, position = EXCLUDED.position
         RETURNING id",
    )
    .bind(&category.slug)
    .bind(category.name.trim())
    .bind(&category.description)
    .bind(&category.image_url)
    .bind(category.position)
    .fetch_one(&mut *conn)
    .await
}

async fn upsert_brand(
    conn: &mut PgConnection,
    slug: &Slug,
    brand: &BrandSeed,
) -> Result<BrandId, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO cradlix.brand (slug, name, logo_url, description, is_featured)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (slug) DO UPDATE
         SET name = EXCLUDED.name, logo_url = EXCLUDED.logo_url,
             description = EXCLUDED.description, is_featured = EXCLUDED.is_featured,
             updated_at = now()
         RETURNING id",
    )
    .bind(slug)
    .bind(brand.name.trim())
    .bind(&brand.logo_url)
    .bind(&brand.description)
    .bind(brand.is_featured)
    .fetch_one(&mut *conn)
    .await
}

async fn upsert_product(
    conn: &mut PgConnection,
    product: &ProductSeed,
    category_id: Option<CategoryId>,
    brand_id: Option<BrandId>,
) -> Result<(), sqlx::Error> {
    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO cradlix.product
            (slug, name, description, category_id, brand_id, price, mrp, stock, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (slug) DO UPDATE
         SET name = EXCLUDED.name, description = EXCLUDED.description,
             category_id = EXCLUDED.category_id, brand_id = EXCLUDED.brand_id,
             price = EXCLUDED.price, mrp = EXCLUDED.mrp, stock = EXCLUDED.stock,
             is_active = EXCLUDED.is_active, updated_at = now()
         RETURNING id",
    )
    .bind(&product.slug)
    .bind(product.name.trim())
    .bind(&product.description)
    .bind(category_id)
    .bind(brand_id)
    .bind(product.price)
    .bind(product.mrp)
    .bind(product.stock)
    .bind(product.is_active)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM cradlix.product_image WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for (position, image) in (0_i32..).zip(&product.images) {
        sqlx::query(
            "INSERT INTO cradlix.product_image (product_id, url, alt_text, position)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(position)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
categories:
  - slug: feeding
    name: Feeding
    position: 1
brands:
  - name: Little Leaf
    is_featured: true
  - slug: snugglebug
    name: SnuggleBug
products:
  - slug: steel-sipper-cup
    name: Steel Sipper Cup
    category: feeding
    brand: little-leaf
    price: "449.00"
    mrp: "599.00"
    stock: 40
    images:
      - url: https://cdn.cradlix.in/p/sipper-1.jpg
        alt_text: Sipper cup, side view
"#;

    #[test]
    fn test_sample_catalog_is_valid() {
        let file: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(validate(&file), Vec::<String>::new());
        assert!(file.products.first().unwrap().is_active);
        assert_eq!(
            brand_slug(file.brands.first().unwrap()).unwrap().as_str(),
            "little-leaf"
        );
    }

    #[test]
    fn test_unknown_references_reported() {
        let yaml = r#"
products:
  - slug: muslin-swaddle
    name: Muslin Swaddle
    category: sleep
    brand: nobody
    price: "799.00"
"#;
        let file: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate(&file);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("unknown category sleep")));
        assert!(errors.iter().any(|e| e.contains("unknown brand nobody")));
    }

    #[test]
    fn test_price_rules() {
        let yaml = r#"
products:
  - slug: rattle
    name: Rattle
    price: "199.999"
  - slug: teether
    name: Teether
    price: "299.00"
    mrp: "249.00"
    stock: -1
"#;
        let file: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate(&file);
        assert!(errors.iter().any(|e| e.starts_with("product rattle: price")));
        assert!(errors.iter().any(|e| e.contains("mrp cannot be below price")));
        assert!(errors.iter().any(|e| e.contains("stock cannot be negative")));
    }

    #[test]
    fn test_duplicate_slugs_reported() {
        let yaml = r#"
brands:
  - name: Tiny Toes
  - slug: tiny-toes
    name: Tiny Toes India
"#;
        let file: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(validate(&file), vec!["brand tiny-toes is listed twice".to_string()]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = "categories:\n  - slug: bath\n    name: Bath\n    colour: blue\n";
        assert!(serde_yaml::from_str::<CatalogFile>(yaml).is_err());
    }
}
