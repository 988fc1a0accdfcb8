//! Home page banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::BannerId;

use crate::validation::{ValidationError, bounded_text, http_url, link_target, optional_text};

/// A banner row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create / replace body.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerRequest {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Validated banner fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
}

impl TryFrom<BannerRequest> for BannerInput {
    type Error = ValidationError;

    fn try_from(req: BannerRequest) -> Result<Self, Self::Error> {
        if req.position < 0 {
            return Err(ValidationError::new("position cannot be negative"));
        }
        Ok(Self {
            title: bounded_text("title", &req.title, 1, 120)?,
            subtitle: optional_text("subtitle", req.subtitle.as_deref(), 200)?,
            image_url: http_url("image_url", &req.image_url)?,
            link_url: link_target("link_url", req.link_url.as_deref())?,
            position: req.position,
            is_active: req.is_active,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> BannerRequest {
        serde_json::from_value(serde_json::json!({
            "title": " Monsoon Essentials ",
            "image_url": "https://cdn.cradlix.in/banners/monsoon.webp",
            "link_url": "/products?category=rainwear",
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_and_trimming() {
        let input = BannerInput::try_from(request()).unwrap();
        assert_eq!(input.title, "Monsoon Essentials");
        assert_eq!(input.position, 0);
        assert!(input.is_active);
        assert_eq!(input.subtitle, None);
    }

    #[test]
    fn test_negative_position_rejected() {
        let mut req = request();
        req.position = -1;
        assert_eq!(
            BannerInput::try_from(req).unwrap_err().to_string(),
            "position cannot be negative"
        );
    }

    #[test]
    fn test_image_must_be_absolute() {
        let mut req = request();
        req.image_url = "/banners/monsoon.webp".to_string();
        assert!(BannerInput::try_from(req).is_err());
    }

    #[test]
    fn test_link_must_be_url_or_path() {
        let mut req = request();
        req.link_url = Some("sale".to_string());
        assert!(BannerInput::try_from(req).is_err());
    }
}
