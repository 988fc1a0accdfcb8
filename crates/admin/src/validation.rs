//! Field validation for back-office forms.
//!
//! Text helpers come from `cradlix_core::validation`; URL checks live here.

use url::Url;

pub use cradlix_core::validation::{ValidationError, bounded_text, invalid, optional_text};

/// An absolute `http` or `https` URL, such as an image on the CDN.
///
/// # Errors
///
/// Returns [`ValidationError`] for anything else.
pub fn http_url(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Ok(value.to_owned())
        }
        _ => Err(ValidationError::new(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

/// An optional [`http_url`]. Blank input becomes `None`.
///
/// # Errors
///
/// Returns [`ValidationError`] when a non-blank value is not an http(s) URL.
pub fn optional_http_url(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| http_url(field, v))
        .transpose()
}

/// A link target: an http(s) URL or a site path beginning with `/`.
///
/// Protocol-relative `//host` links are rejected.
///
/// # Errors
///
/// Returns [`ValidationError`] for anything else.
pub fn link_target(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.starts_with('/') && !value.starts_with("//") {
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::new(format!(
                "{field} must not contain spaces"
            )));
        }
        return Ok(Some(value.to_owned()));
    }
    http_url(field, value).map(Some).map_err(|_| {
        ValidationError::new(format!(
            "{field} must be an http(s) URL or a path starting with /"
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url() {
        assert!(http_url("image_url", "https://cdn.cradlix.in/banners/monsoon.webp").is_ok());
        assert!(http_url("image_url", "http://localhost:9000/a.png").is_ok());
        assert!(http_url("image_url", "ftp://cdn.cradlix.in/a.png").is_err());
        assert!(http_url("image_url", "javascript:alert(1)").is_err());
        assert!(http_url("image_url", "/banners/a.png").is_err());
    }

    #[test]
    fn test_optional_http_url() {
        assert_eq!(optional_http_url("logo_url", None).unwrap(), None);
        assert_eq!(optional_http_url("logo_url", Some("")).unwrap(), None);
        assert!(optional_http_url("logo_url", Some("logo.png")).is_err());
    }

    #[test]
    fn test_link_target() {
        assert_eq!(
            link_target("link_url", Some("/products?category=diapers")).unwrap(),
            Some("/products?category=diapers".to_string())
        );
        assert!(link_target("link_url", Some("https://cradlix.in/sale")).is_ok());
        assert_eq!(link_target("link_url", Some(" ")).unwrap(), None);
        assert!(link_target("link_url", Some("//evil.example/x")).is_err());
        assert!(link_target("link_url", Some("products")).is_err());
        assert!(link_target("link_url", Some("/bad path")).is_err());
    }
}
