//! Admin bootstrap.
//!
//! # Environment Variables
//!
//! - `CRADLIX_ADMIN_PASSWORD` - password for the account (at least 12 characters)

use thiserror::Error;

use cradlix_admin::db::{AdminUserRepository, RepositoryError};
use cradlix_admin::services::{AuthError, hash_password, validate_password};
use cradlix_admin::validation::{ValidationError, bounded_text};
use cradlix_core::{Email, EmailError};

use super::{ConnectError, connect};

const PASSWORD_VAR: &str = "CRADLIX_ADMIN_PASSWORD";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create an admin, or promote an existing account and reset its password.
pub async fn create(email: &str, name: &str) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;
    let name = bounded_text("name", name, 1, 100)?;
    let password =
        std::env::var(PASSWORD_VAR).map_err(|_| AdminError::MissingEnvVar(PASSWORD_VAR))?;
    validate_password(&password)?;
    let password_hash = hash_password(&password)?;

    let pool = connect().await?;
    let admin = AdminUserRepository::new(&pool)
        .upsert_admin(&email, &name, &password_hash)
        .await?;

    tracing::info!(admin_id = %admin.id, email = %admin.email, "Admin account ready");
    Ok(())
}
