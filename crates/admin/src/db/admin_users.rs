//! Admin account repository.
//!
//! Admins live in `cradlix.user`; this repository only reads what login
//! needs and lets the CLI create or promote an admin.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cradlix_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::AdminUser;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Row with the password hash, for login only.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: UserId,
    email: String,
    name: String,
    role: UserRole,
    created_at: DateTime<Utc>,
    password_hash: String,
}

impl CredentialRow {
    fn into_parts(self) -> Result<(AdminUser, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok((
            AdminUser {
                id: self.id,
                email,
                name: self.name,
                role: self.role,
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for back-office accounts.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user of any role with their password hash.
    ///
    /// The caller decides whether the role may log in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, email, name, role, created_at, password_hash
             FROM cradlix.user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(CredentialRow::into_parts).transpose()
    }

    /// Create an admin, or promote and re-password an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_admin(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let user = sqlx::query_as::<_, AdminUser>(
            "INSERT INTO cradlix.user (email, name, password_hash, role)
             VALUES ($1, $2, $3, 'admin')
             ON CONFLICT (email) DO UPDATE
             SET name = EXCLUDED.name,
                 password_hash = EXCLUDED.password_hash,
                 role = 'admin',
                 updated_at = now()
             RETURNING id, email, name, role, created_at",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await?;
        Ok(user)
    }
}
