//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login (Argon2id)
//! - `cache` - In-memory cache for categories, brands and home content
//! - `checkout` - Pricing, order placement and payment confirmation
//! - `razorpay` - Razorpay Orders API client and signature checks

pub mod auth;
pub mod cache;
pub mod checkout;
pub mod razorpay;
