//! Store requests under review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cradlix_core::{Email, PhoneNumber, StoreRequestId, StoreRequestStatus, UserId};

use crate::validation::{ValidationError, optional_text, bounded_text};

/// A store request with its applicant.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreRequest {
    pub id: StoreRequestId,
    pub user_id: UserId,
    pub applicant_name: String,
    pub applicant_email: Email,
    pub store_name: String,
    pub business_email: Email,
    pub phone: PhoneNumber,
    pub gst_number: Option<String>,
    pub pickup_address: String,
    pub description: Option<String>,
    pub status: StoreRequestStatus,
    pub admin_note: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `?status=&page=`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StoreRequestFilter {
    pub status: Option<StoreRequestStatus>,
    pub page: Option<u32>,
}

/// Approve / reject body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionRequest {
    pub note: Option<String>,
}

/// The outcome an admin chose, with the note to store and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub status: StoreRequestStatus,
    pub note: Option<String>,
}

impl Decision {
    /// Approval; the note is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the note is too long.
    pub fn approve(req: DecisionRequest) -> Result<Self, ValidationError> {
        Ok(Self {
            status: StoreRequestStatus::Approved,
            note: optional_text("note", req.note.as_deref(), 1000)?,
        })
    }

    /// Rejection; the applicant must be told why.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the note is missing or too long.
    pub fn reject(req: DecisionRequest) -> Result<Self, ValidationError> {
        Ok(Self {
            status: StoreRequestStatus::Rejected,
            note: Some(bounded_text("note", req.note.as_deref().unwrap_or(""), 1, 1000)?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_note_optional() {
        let decision = Decision::approve(DecisionRequest::default()).unwrap();
        assert_eq!(decision.status, StoreRequestStatus::Approved);
        assert_eq!(decision.note, None);
    }

    #[test]
    fn test_reject_requires_note() {
        let err = Decision::reject(DecisionRequest::default()).unwrap_err();
        assert_eq!(err.to_string(), "note is required");

        let err = Decision::reject(DecisionRequest {
            note: Some("   ".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "note is required");

        let decision = Decision::reject(DecisionRequest {
            note: Some("GST number does not match the business name".to_string()),
        })
        .unwrap();
        assert_eq!(decision.status, StoreRequestStatus::Rejected);
    }

    #[test]
    fn test_filter_parses_status() {
        let filter: StoreRequestFilter =
            serde_json::from_value(serde_json::json!({ "status": "pending" })).unwrap();
        assert_eq!(filter.status, Some(StoreRequestStatus::Pending));
        assert_eq!(filter.page, None);
    }
}
