//! Business logic services for admin.
//!
//! - `auth` - password login restricted to admin accounts
//! - `email` - store request decision emails via SMTP

pub mod auth;
pub mod email;

pub use auth::{AuthError, AuthService, hash_password, validate_password};
pub use email::{EmailError, EmailService};
