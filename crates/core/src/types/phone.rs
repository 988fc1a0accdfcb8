//! Indian mobile phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing left after stripping separators.
    #[error("phone number is required")]
    Empty,
    /// A character other than a digit or an allowed separator.
    #[error("phone number may only contain digits")]
    InvalidCharacter,
    /// Not ten digits once the country prefix is removed.
    #[error("a 10-digit phone number is required (got {got} digits)")]
    WrongLength {
        /// Number of digits found.
        got: usize,
    },
    /// Not an Indian mobile number (foreign country code, or first digit not 6-9).
    #[error("enter an Indian mobile number starting with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// A 10-digit Indian mobile number, stored without country prefix.
///
/// Spaces, dashes and parentheses are ignored, as is a leading `+91`,
/// `91` (when followed by ten digits) or trunk `0`.
///
/// ```
/// use cradlix_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+91 98765-43210").unwrap();
/// assert_eq!(phone.as_str(), "9876543210");
/// assert_eq!(phone.e164(), "+919876543210");
///
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of digits in a national mobile number.
    pub const DIGITS: usize = 10;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] describing why the input is not a mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let (had_plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |r| (true, r));

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidCharacter),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let national = if had_plus {
            digits.strip_prefix("91").ok_or(PhoneError::InvalidPrefix)?
        } else if digits.len() == Self::DIGITS + 2
            && let Some(rest) = digits.strip_prefix("91")
        {
            rest
        } else if digits.len() == Self::DIGITS + 1
            && let Some(rest) = digits.strip_prefix('0')
        {
            rest
        } else {
            digits.as_str()
        };

        if national.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                got: national.len(),
            });
        }

        if !national.starts_with(['6', '7', '8', '9']) {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(national.to_owned()))
    }

    /// The ten national digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number in E.164 form, as Razorpay prefill expects.
    #[must_use]
    pub fn e164(&self) -> String {
        format!("+91{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl_text_sqlx!(PhoneNumber);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ten_digits() {
        assert_eq!(PhoneNumber::parse("9876543210").unwrap().as_str(), "9876543210");
        assert!(PhoneNumber::parse("6000000000").is_ok());
    }

    #[test]
    fn test_strips_separators_and_prefixes() {
        for input in [
            "98765 43210",
            "98765-43210",
            "(98765) 43210",
            "+91 98765 43210",
            "+91-9876543210",
            "919876543210",
            "09876543210",
        ] {
            assert_eq!(
                PhoneNumber::parse(input).unwrap().as_str(),
                "9876543210",
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse(" - "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            PhoneNumber::parse("98765x3210"),
            Err(PhoneError::InvalidCharacter)
        );
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("98765"),
            Err(PhoneError::WrongLength { got: 5 })
        );
        assert_eq!(
            PhoneNumber::parse("98765432101"),
            Err(PhoneError::WrongLength { got: 11 })
        );
    }

    #[test]
    fn test_invalid_prefix() {
        assert_eq!(
            PhoneNumber::parse("1234567890"),
            Err(PhoneError::InvalidPrefix)
        );
        assert_eq!(
            PhoneNumber::parse("5876543210"),
            Err(PhoneError::InvalidPrefix)
        );
        assert_eq!(
            PhoneNumber::parse("+1 4155550123"),
            Err(PhoneError::InvalidPrefix)
        );
    }

    #[test]
    fn test_error_message_mentions_ten_digits() {
        let err = PhoneNumber::parse("123").unwrap_err();
        assert!(err.to_string().starts_with("a 10-digit phone number is required"));
    }

    #[test]
    fn test_e164() {
        let phone = PhoneNumber::parse("7012345678").unwrap();
        assert_eq!(phone.e164(), "+917012345678");
    }
}
