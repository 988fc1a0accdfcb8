//! Cradlix Core - shared domain types.
//!
//! Used by every Cradlix component:
//! - `storefront` - public JSON API (catalog, cart, checkout)
//! - `admin` - back-office JSON API (content, store requests, orders)
//! - `cli` - migrations, seeding and operational commands
//!
//! The crate holds types only. No I/O, no database access, no HTTP clients.
//! Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - type-safe IDs, validated contact data, money and statuses
//! - [`validation`] - trimmed, length-checked text fields for request bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
