//! URL slugs for products, categories and brands.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing usable in the input.
    #[error("slug cannot be empty")]
    Empty,
    /// Longer than [`Slug::MAX_LENGTH`].
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Anything other than lowercase letters, digits and single inner hyphens.
    #[error("slug may only contain lowercase letters, digits and single hyphens")]
    InvalidFormat,
}

/// A lowercase, hyphen-separated identifier such as `organic-cotton-onesie`.
///
/// ```
/// use cradlix_core::Slug;
///
/// let slug = Slug::from_name("Baby's First  Rattle!").unwrap();
/// assert_eq!(slug.as_str(), "baby-s-first-rattle");
/// assert!(Slug::parse("Bad Slug").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 120;

    /// Validate an existing slug.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError`] if the input is empty, too long, or has
    /// characters outside `[a-z0-9-]`, leading/trailing or doubled hyphens.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let valid_chars = s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !valid_chars || s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Runs of non-alphanumeric characters collapse into one hyphen and
    /// non-ASCII letters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] when the name has no ASCII alphanumerics.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
        Self::parse(&slug)
    }

    /// The slug text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl_text_sqlx!(Slug);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            Slug::from_name("Soft Muslin Swaddle (Pack of 3)").unwrap().as_str(),
            "soft-muslin-swaddle-pack-of-3"
        );
        assert_eq!(Slug::from_name("  --Hello--  ").unwrap().as_str(), "hello");
        assert_eq!(Slug::from_name("Crème Brûlée").unwrap().as_str(), "cr-me-br-l-e");
    }

    #[test]
    fn test_from_name_empty() {
        assert_eq!(Slug::from_name("!!!"), Err(SlugError::Empty));
        assert_eq!(Slug::from_name("ಮಗು"), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_name_truncates() {
        let slug = Slug::from_name(&"ab ".repeat(100)).unwrap();
        assert!(slug.as_str().len() <= Slug::MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }

    #[test]
    fn test_parse() {
        assert!(Slug::parse("baby-care").is_ok());
        assert_eq!(Slug::parse("Baby"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse("-baby"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse("baby--care"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }
}
