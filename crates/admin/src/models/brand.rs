//! Brands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{BrandId, Slug};

use crate::validation::{
    ValidationError, bounded_text, invalid, optional_http_url, optional_text,
};

/// A brand row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: BrandId,
    pub slug: Slug,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create / replace body. `slug` is derived from `name` when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandRequest {
    pub name: String,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Validated brand fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandInput {
    pub name: String,
    pub slug: Slug,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
}

impl TryFrom<BrandRequest> for BrandInput {
    type Error = ValidationError;

    fn try_from(req: BrandRequest) -> Result<Self, Self::Error> {
        let name = bounded_text("name", &req.name, 1, 100)?;
        let slug = match req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => Slug::parse(slug).map_err(invalid)?,
            None => Slug::from_name(&name).map_err(|_| {
                ValidationError::new("name needs at least one letter or digit to build a slug")
            })?,
        };

        Ok(Self {
            name,
            slug,
            logo_url: optional_http_url("logo_url", req.logo_url.as_deref())?,
            description: optional_text("description", req.description.as_deref(), 2000)?,
            is_featured: req.is_featured,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(name: &str, slug: Option<&str>) -> BrandRequest {
        BrandRequest {
            name: name.to_string(),
            slug: slug.map(String::from),
            logo_url: None,
            description: None,
            is_featured: false,
        }
    }

    #[test]
    fn test_slug_derived_from_name() {
        let input = BrandInput::try_from(request("Mother's Touch", None)).unwrap();
        assert_eq!(input.slug.as_str(), "mother-s-touch");
    }

    #[test]
    fn test_explicit_slug_validated() {
        let input = BrandInput::try_from(request("Himalaya Baby", Some("himalaya"))).unwrap();
        assert_eq!(input.slug.as_str(), "himalaya");
        assert!(BrandInput::try_from(request("Himalaya Baby", Some("Himalaya Baby"))).is_err());
    }

    #[test]
    fn test_name_without_ascii_needs_slug() {
        assert!(BrandInput::try_from(request("शिशु", None)).is_err());
        assert!(BrandInput::try_from(request("शिशु", Some("shishu"))).is_ok());
    }

    #[test]
    fn test_logo_must_be_url() {
        let mut req = request("Mee Mee", None);
        req.logo_url = Some("logo.png".to_string());
        assert!(BrandInput::try_from(req).is_err());
    }
}
