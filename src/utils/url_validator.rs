//! Destination URL validation.
//!
//! Destinations are stored exactly as the owner submitted them (minus surrounding
//! whitespace) so that the `(url, owner)` deduplication key matches what the owner
//! typed. Validation only rejects values that could never be redirected to.

use url::Url;

/// Upper bound on stored destination length.
pub const MAX_URL_LENGTH: usize = 2048;

/// Reasons a destination URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Validates a destination URL and returns its canonical stored form.
///
/// # Rules
///
/// 1. Leading and trailing whitespace is trimmed
/// 2. Must parse as an absolute URL
/// 3. Only `http` and `https` schemes are accepted
/// 4. A host is required
/// 5. At most [`MAX_URL_LENGTH`] characters
///
/// Rejects `javascript:`, `data:`, `file:` and similar schemes that would turn the
/// redirect into an injection vector.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(validate_destination("  https://example.com ").unwrap(), "https://example.com");
/// assert!(validate_destination("ftp://example.com").is_err());
/// ```
pub fn validate_destination(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();

    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed.to_string())
}
