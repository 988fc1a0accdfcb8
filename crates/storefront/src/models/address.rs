//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{AddressId, PhoneNumber, Pincode, UserId};

use cradlix_core::validation::{ValidationError, invalid, optional_text, required_text};

const MAX_NAME: usize = 100;
const MAX_LINE: usize = 200;
const MAX_REGION: usize = 100;

/// A saved shipping address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    pub full_name: String,
    pub phone: PhoneNumber,
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: Pincode,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// Address fields as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressRequest {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Validated address fields ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    pub full_name: String,
    pub phone: PhoneNumber,
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: Pincode,
    pub is_default: bool,
}

impl TryFrom<AddressRequest> for AddressInput {
    type Error = ValidationError;

    fn try_from(req: AddressRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            full_name: required_text("full_name", &req.full_name, MAX_NAME)?,
            phone: PhoneNumber::parse(&req.phone).map_err(invalid)?,
            line1: required_text("line1", &req.line1, MAX_LINE)?,
            line2: optional_text("line2", req.line2.as_deref(), MAX_LINE)?,
            landmark: optional_text("landmark", req.landmark.as_deref(), MAX_LINE)?,
            city: required_text("city", &req.city, MAX_REGION)?,
            state: required_text("state", &req.state, MAX_REGION)?,
            pincode: Pincode::parse(&req.pincode).map_err(invalid)?,
            is_default: req.is_default,
        })
    }
}

/// Copy of an address frozen into an order.
///
/// Later edits to the saved address never change where an order ships.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<&Address> for AddressSnapshot {
    fn from(a: &Address) -> Self {
        Self {
            full_name: a.full_name.clone(),
            phone: a.phone.to_string(),
            line1: a.line1.clone(),
            line2: a.line2.clone(),
            landmark: a.landmark.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            pincode: a.pincode.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> AddressRequest {
        AddressRequest {
            full_name: " Priya Sharma ".to_string(),
            phone: "+91 98450 12345".to_string(),
            line1: "12, 4th Cross, Indiranagar".to_string(),
            line2: Some(String::new()),
            landmark: Some("Near CMH Hospital".to_string()),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560038".to_string(),
            is_default: false,
        }
    }

    #[test]
    fn test_valid_address_is_normalized() {
        let input = AddressInput::try_from(request()).unwrap();
        assert_eq!(input.full_name, "Priya Sharma");
        assert_eq!(input.phone.as_str(), "9845012345");
        assert_eq!(input.line2, None);
        assert_eq!(input.landmark.as_deref(), Some("Near CMH Hospital"));
    }

    #[test]
    fn test_short_phone_rejected() {
        let mut req = request();
        req.phone = "98450".to_string();
        let err = AddressInput::try_from(req).unwrap_err();
        assert!(err.to_string().contains("10-digit phone number"));
    }

    #[test]
    fn test_bad_pincode_rejected() {
        let mut req = request();
        req.pincode = "56003".to_string();
        assert!(AddressInput::try_from(req).is_err());
    }

    #[test]
    fn test_missing_city_rejected() {
        let mut req = request();
        req.city = "  ".to_string();
        let err = AddressInput::try_from(req).unwrap_err();
        assert_eq!(err.to_string(), "city is required");
    }

    #[test]
    fn test_overlong_line_rejected() {
        let mut req = request();
        req.line1 = "x".repeat(201);
        assert!(AddressInput::try_from(req).is_err());
    }
}
