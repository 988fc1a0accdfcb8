//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{Rating, ReviewId};

use cradlix_core::validation::{ValidationError, invalid, optional_text, required_text};

const MAX_TITLE: usize = 120;
const MAX_BODY: usize = 2000;

/// A published review with its author's display name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub rating: Rating,
    pub title: Option<String>,
    pub body: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// `POST /api/products/{slug}/reviews` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    pub title: Option<String>,
    pub body: String,
}

/// Validated review fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: Rating,
    pub title: Option<String>,
    pub body: String,
}

impl TryFrom<ReviewRequest> for ReviewInput {
    type Error = ValidationError;

    fn try_from(req: ReviewRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            rating: Rating::new(req.rating).map_err(invalid)?,
            title: optional_text("title", req.title.as_deref(), MAX_TITLE)?,
            body: required_text("body", &req.body, MAX_BODY)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let req = |rating| ReviewRequest {
            rating,
            title: None,
            body: "Soft and washes well".to_string(),
        };
        assert!(ReviewInput::try_from(req(5)).is_ok());
        assert!(ReviewInput::try_from(req(0)).is_err());
        assert!(ReviewInput::try_from(req(6)).is_err());
    }

    #[test]
    fn test_body_limits() {
        let req = |body: String| ReviewRequest {
            rating: 4,
            title: Some("Good".to_string()),
            body,
        };
        assert!(ReviewInput::try_from(req(" ".to_string())).is_err());
        assert!(ReviewInput::try_from(req("x".repeat(2000))).is_ok());
        assert!(ReviewInput::try_from(req("x".repeat(2001))).is_err());
    }
}
