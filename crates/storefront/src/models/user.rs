//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{Email, PhoneNumber, UserId, UserRole};

use cradlix_core::validation::{ValidationError, bounded_text, invalid};

/// A registered account. Doubles as the profile response body.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// `PUT /api/user/profile` body. Email is not editable.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    pub phone: Option<String>,
}

/// Validated profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInput {
    pub name: String,
    pub phone: Option<PhoneNumber>,
}

impl TryFrom<ProfileRequest> for ProfileInput {
    type Error = ValidationError;

    fn try_from(req: ProfileRequest) -> Result<Self, Self::Error> {
        let phone = match req.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(PhoneNumber::parse(raw).map_err(invalid)?),
        };
        Ok(Self {
            name: bounded_text("name", &req.name, 1, 100)?,
            phone,
        })
    }
}
