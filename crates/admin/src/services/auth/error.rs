//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, wrong password, or an account that is not an admin.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Argon2 failed to produce a hash.
    #[error("password hashing failed")]
    PasswordHash,
}
