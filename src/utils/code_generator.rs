//! Short code generation and validation utilities.
//!
//! Generated codes come straight from the OS entropy source. Collision handling
//! lives in [`crate::application::services::LinkService`], not here.

use crate::error::AppError;
use serde_json::json;

/// Symbols a generated code is drawn from.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every generated code.
pub const CODE_LENGTH: usize = 5;

/// Longest code accepted through an update.
pub const MAX_CODE_LENGTH: usize = 32;

/// Bytes at or above this value are discarded so that `byte % 62` is uniform.
const REJECTION_THRESHOLD: u8 = (256 - 256 % ALPHABET.len()) as u8;

/// Codes that would shadow routes served next to the redirect.
const RESERVED_CODES: &[&str] = &["api", "health"];

/// Generates a random 5-character code over the 62-symbol alphanumeric alphabet.
///
/// Uses `getrandom` for entropy with rejection sampling, so every symbol is
/// equally likely and each call is independent of previous ones.
///
/// # Errors
///
/// Returns [`AppError::Store`] if the entropy source is unavailable. The caller
/// must treat this as fatal for the current operation.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code()?;
/// assert_eq!(code.len(), 5);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> Result<String, AppError> {
    let mut code = String::with_capacity(CODE_LENGTH);
    let mut buffer = [0u8; 16];

    while code.len() < CODE_LENGTH {
        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::store(
                "Entropy source unavailable",
                json!({ "reason": e.to_string() }),
            )
        })?;

        for &byte in buffer.iter().filter(|&&b| b < REJECTION_THRESHOLD) {
            code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            if code.len() == CODE_LENGTH {
                break;
            }
        }
    }

    Ok(code)
}

/// Validates a short code supplied through a link update.
///
/// # Rules
///
/// - Length: 1-32 characters
/// - Allowed characters: ASCII letters and digits
/// - Cannot be a reserved route segment
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_short_code(code: &str) -> Result<(), AppError> {
    if code.is_empty() || code.len() > MAX_CODE_LENGTH {
        return Err(AppError::bad_request(
            format!("Short code must be 1-{MAX_CODE_LENGTH} characters"),
            json!({ "provided_length": code.len() }),
        ));
    }

    if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AppError::bad_request(
            "Short code can only contain letters and digits",
            json!({ "short_code": code }),
        ));
    }

    if RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
    {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "short_code": code }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_generate_code_has_correct_length() {
        for _ in 0..100 {
            assert_eq!(generate_code().unwrap().len(), CODE_LENGTH);
        }
    }

    #[test]
    fn test_generate_code_uses_alphabet_only() {
        for _ in 0..500 {
            let code = generate_code().unwrap();
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)), "{code}");
        }
    }

    #[test]
    fn test_generate_code_produces_distinct_codes() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code().unwrap()).collect();
        // 62^5 combinations; a handful of collisions in 1000 draws is practically impossible
        assert!(codes.len() >= 998);
    }

    #[test]
    fn test_generate_code_covers_alphabet() {
        let mut seen: HashMap<u8, usize> = HashMap::new();
        for _ in 0..2000 {
            for b in generate_code().unwrap().bytes() {
                *seen.entry(b).or_default() += 1;
            }
        }
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_rejection_threshold() {
        assert_eq!(REJECTION_THRESHOLD, 248);
    }

    #[test]
    fn test_validate_accepts_alphanumeric() {
        assert!(validate_short_code("aB3").is_ok());
        assert!(validate_short_code("Z").is_ok());
        assert!(validate_short_code(&"x".repeat(MAX_CODE_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_length() {
        assert!(validate_short_code("").is_err());
        let err = validate_short_code(&"x".repeat(MAX_CODE_LENGTH + 1)).unwrap_err();
        assert!(err.to_string().contains("1-32 characters"));
    }

    #[test]
    fn test_validate_rejects_symbols() {
        for code in ["my-code", "my_code", "a b", "ünï", "../x"] {
            assert!(validate_short_code(code).is_err(), "{code}");
        }
    }

    #[test]
    fn test_validate_rejects_reserved() {
        for &reserved in RESERVED_CODES {
            assert!(validate_short_code(reserved).is_err());
        }
        assert!(validate_short_code("API").is_err());
    }
}
