//! Back-office accounts.
//!
//! Admins are rows in `cradlix.user` with role `admin`; there is no separate
//! admin table.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cradlix_core::{Email, UserId, UserRole};

/// A user row as seen by the back office login.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    /// Only the `admin` role may use the back office.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
