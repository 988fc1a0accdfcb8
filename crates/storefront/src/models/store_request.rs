//! Vendor applications to sell on Cradlix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{Email, PhoneNumber, StoreRequestId, StoreRequestStatus};

use cradlix_core::validation::{ValidationError, bounded_text, invalid, optional_text, required_text};

const GST_LENGTH: usize = 15;

/// A submitted store request.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreRequest {
    pub id: StoreRequestId,
    pub store_name: String,
    pub business_email: Email,
    pub phone: PhoneNumber,
    pub gst_number: Option<String>,
    pub pickup_address: String,
    pub description: Option<String>,
    pub status: StoreRequestStatus,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `POST /api/store-requests` body.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequestForm {
    pub store_name: String,
    pub business_email: String,
    pub phone: String,
    pub gst_number: Option<String>,
    pub pickup_address: String,
    pub description: Option<String>,
}

/// Validated store request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequestInput {
    pub store_name: String,
    pub business_email: Email,
    pub phone: PhoneNumber,
    pub gst_number: Option<String>,
    pub pickup_address: String,
    pub description: Option<String>,
}

impl TryFrom<StoreRequestForm> for StoreRequestInput {
    type Error = ValidationError;

    fn try_from(form: StoreRequestForm) -> Result<Self, Self::Error> {
        let gst_number = optional_text("gst_number", form.gst_number.as_deref(), GST_LENGTH)?
            .map(|gst| gst.to_ascii_uppercase());
        if let Some(gst) = &gst_number
            && (gst.len() != GST_LENGTH || !gst.bytes().all(|b| b.is_ascii_alphanumeric()))
        {
            return Err(ValidationError::new(
                "gst_number must be 15 letters and digits",
            ));
        }

        Ok(Self {
            store_name: bounded_text("store_name", &form.store_name, 2, 100)?,
            business_email: Email::parse(&form.business_email).map_err(invalid)?,
            phone: PhoneNumber::parse(&form.phone).map_err(invalid)?,
            gst_number,
            pickup_address: required_text("pickup_address", &form.pickup_address, 500)?,
            description: optional_text("description", form.description.as_deref(), 2000)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> StoreRequestForm {
        StoreRequestForm {
            store_name: "Little Sprouts".to_string(),
            business_email: "Hello@LittleSprouts.in".to_string(),
            phone: "9123456780".to_string(),
            gst_number: Some("29abcde1234f1z5".to_string()),
            pickup_address: "Plot 7, HSR Layout, Bengaluru 560102".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let input = StoreRequestInput::try_from(form()).unwrap();
        assert_eq!(input.business_email.as_str(), "hello@littlesprouts.in");
        assert_eq!(input.gst_number.as_deref(), Some("29ABCDE1234F1Z5"));
    }

    #[test]
    fn test_gst_optional() {
        let mut f = form();
        f.gst_number = Some("  ".to_string());
        assert_eq!(StoreRequestInput::try_from(f).unwrap().gst_number, None);
    }

    #[test]
    fn test_gst_format() {
        let mut f = form();
        f.gst_number = Some("29ABCDE1234F1Z".to_string());
        assert!(StoreRequestInput::try_from(f).is_err());

        let mut f = form();
        f.gst_number = Some("29ABCDE1234F1Z-".to_string());
        assert!(StoreRequestInput::try_from(f).is_err());
    }

    #[test]
    fn test_store_name_length() {
        let mut f = form();
        f.store_name = "A".to_string();
        assert!(StoreRequestInput::try_from(f).is_err());
    }

    #[test]
    fn test_phone_required() {
        let mut f = form();
        f.phone = "12345".to_string();
        let err = StoreRequestInput::try_from(f).unwrap_err();
        assert!(err.to_string().contains("10-digit"));
    }
}
