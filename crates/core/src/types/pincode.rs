//! Indian postal index numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// Not six ASCII digits.
    #[error("pincode must be exactly 6 digits")]
    Malformed,
    /// PIN codes never start with zero.
    #[error("pincode cannot start with 0")]
    LeadingZero,
}

/// A six-digit PIN code.
///
/// ```
/// use cradlix_core::Pincode;
///
/// assert_eq!(Pincode::parse(" 560001 ").unwrap().as_str(), "560001");
/// assert!(Pincode::parse("060001").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Parse a PIN code.
    ///
    /// # Errors
    ///
    /// Returns a [`PincodeError`] if the input is not six digits starting 1-9.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::Malformed);
        }
        if s.starts_with('0') {
            return Err(PincodeError::LeadingZero);
        }
        Ok(Self(s.to_owned()))
    }

    /// The PIN code digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pincode: Pincode) -> Self {
        pincode.0
    }
}

impl_text_sqlx!(Pincode);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        assert!(Pincode::parse("110001").is_ok());
        assert!(Pincode::parse("999999").is_ok());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(Pincode::parse("11000"), Err(PincodeError::Malformed));
        assert_eq!(Pincode::parse("1100011"), Err(PincodeError::Malformed));
        assert_eq!(Pincode::parse("11000a"), Err(PincodeError::Malformed));
        assert_eq!(Pincode::parse(""), Err(PincodeError::Malformed));
    }

    #[test]
    fn test_leading_zero() {
        assert_eq!(Pincode::parse("012345"), Err(PincodeError::LeadingZero));
    }
}
