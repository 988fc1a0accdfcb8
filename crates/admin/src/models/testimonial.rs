//! Customer testimonials shown on the home page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{Rating, TestimonialId};

use crate::validation::{ValidationError, bounded_text, invalid, optional_http_url, optional_text};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Testimonial {
    pub id: TestimonialId,
    pub author_name: String,
    pub author_location: Option<String>,
    pub quote: String,
    pub rating: Rating,
    pub avatar_url: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestimonialRequest {
    pub author_name: String,
    pub author_location: Option<String>,
    pub quote: String,
    pub rating: i64,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialInput {
    pub author_name: String,
    pub author_location: Option<String>,
    pub quote: String,
    pub rating: Rating,
    pub avatar_url: Option<String>,
    pub is_published: bool,
}

impl TryFrom<TestimonialRequest> for TestimonialInput {
    type Error = ValidationError;

    fn try_from(req: TestimonialRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            author_name: bounded_text("author_name", &req.author_name, 1, 100)?,
            author_location: optional_text("author_location", req.author_location.as_deref(), 100)?,
            quote: bounded_text("quote", &req.quote, 1, 1000)?,
            rating: Rating::new(req.rating).map_err(invalid)?,
            avatar_url: optional_http_url("avatar_url", req.avatar_url.as_deref())?,
            is_published: req.is_published,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(rating: i64) -> TestimonialRequest {
        TestimonialRequest {
            author_name: "Priya S.".to_string(),
            author_location: Some("Kochi".to_string()),
            quote: "The muslin swaddles are so soft, my daughter sleeps longer.".to_string(),
            rating,
            avatar_url: None,
            is_published: true,
        }
    }

    #[test]
    fn test_valid() {
        let input = TestimonialInput::try_from(request(5)).unwrap();
        assert_eq!(input.rating.get(), 5);
    }

    #[test]
    fn test_rating_range() {
        assert!(TestimonialInput::try_from(request(0)).is_err());
        let err = TestimonialInput::try_from(request(6)).unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5 (got 6)");
    }

    #[test]
    fn test_quote_length() {
        let mut req = request(4);
        req.quote = "a".repeat(1001);
        assert!(TestimonialInput::try_from(req).is_err());
    }
}
