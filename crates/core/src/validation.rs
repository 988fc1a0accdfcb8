//! Text field validation shared by the storefront and the back office.
//!
//! Every helper returns a message fit for a client toast.

use thiserror::Error;

/// A request field failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trim a required text field and check its length in characters.
///
/// # Errors
///
/// Returns [`ValidationError`] when the trimmed value is empty or longer than `max`.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    bounded_text(field, value, 1, max)
}

/// Trim a text field and check it holds `min..=max` characters.
///
/// # Errors
///
/// Returns [`ValidationError`] when the length is out of range.
pub fn bounded_text(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    if len < min {
        return Err(ValidationError::new(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if len > max {
        return Err(ValidationError::new(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field. Blank input becomes `None`.
///
/// # Errors
///
/// Returns [`ValidationError`] when the trimmed value is longer than `max`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Convert a core type's parse error into a [`ValidationError`].
#[must_use]
pub fn invalid<E: std::fmt::Display>(e: E) -> ValidationError {
    ValidationError(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("name", "  Asha  ", 100).unwrap(), "Asha");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        let err = required_text("name", "   ", 100).unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(required_text("city", "बेंगलुरु", 8).is_ok());
        assert!(required_text("city", "बेंगलुरु", 7).is_err());
    }

    #[test]
    fn test_bounded_text_minimum() {
        let err = bounded_text("store_name", "A", 2, 100).unwrap_err();
        assert_eq!(err.to_string(), "store_name must be at least 2 characters");
    }

    #[test]
    fn test_bounded_text_maximum() {
        assert_eq!(
            bounded_text("title", &"x".repeat(121), 1, 120).unwrap_err().to_string(),
            "title must be at most 120 characters"
        );
    }

    #[test]
    fn test_invalid_keeps_parse_message() {
        let err = invalid(crate::PincodeError::LeadingZero);
        assert_eq!(err.to_string(), "pincode cannot start with 0");
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("landmark", None, 10).unwrap(), None);
        assert_eq!(optional_text("landmark", Some("  "), 10).unwrap(), None);
        assert_eq!(
            optional_text("landmark", Some(" Temple "), 10).unwrap(),
            Some("Temple".to_string())
        );
        assert!(optional_text("landmark", Some("much too long"), 4).is_err());
    }
}
