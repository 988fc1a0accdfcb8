//! Home page content managed from the back office.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cradlix_core::{BannerId, Rating, TestimonialId};

use super::Brand;

/// A hero or promo banner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
}

/// A customer quote.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Testimonial {
    pub id: TestimonialId,
    pub author_name: String,
    pub author_location: Option<String>,
    pub quote: String,
    pub rating: Rating,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `GET /api/home` body.
#[derive(Debug, Clone, Serialize)]
pub struct HomeContent {
    pub banners: Vec<Banner>,
    pub brands: Vec<Brand>,
    pub testimonials: Vec<Testimonial>,
}
