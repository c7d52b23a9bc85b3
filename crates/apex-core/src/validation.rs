//! # Validation Module
//!
//! Input validation for customer fields, cheque dates and the cart.
//!
//! Validation failures block the action and surface the variant's message
//! without mutating any state; the backend re-validates everything on
//! submission and its rejections are surfaced verbatim.

use crate::error::{ValidationError, ValidationResult};
use crate::types::CartLine;

// =============================================================================
// String Helpers
// =============================================================================

/// Strips every non-digit character.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `true` when the value has the `YYYY-MM-DD` shape.
///
/// This is the wire contract for cheque dates; calendar validity is only
/// enforced where day arithmetic needs it (see [`crate::annotations`]).
pub fn is_cheque_date_format(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a customer name: required, letters and spaces only.
///
/// Returns the trimmed name.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::CustomerNameRequired);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        return Err(ValidationError::CustomerNameInvalid);
    }
    Ok(name.to_string())
}

/// Validates a customer phone: optional, but exactly 10 digits when
/// present (after stripping separators).
///
/// Returns the normalized digits, or `None` when the field was empty.
pub fn validate_customer_phone(phone: &str) -> ValidationResult<Option<String>> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return Ok(None);
    }
    if digits.len() != 10 {
        return Err(ValidationError::CustomerPhoneInvalid);
    }
    Ok(Some(digits))
}

/// Validates a cheque due date's shape, returning the trimmed text.
pub fn validate_cheque_date(value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if !is_cheque_date_format(value) {
        return Err(ValidationError::ChequeDateRequired);
    }
    Ok(value.to_string())
}

/// A sale needs at least one line.
pub fn validate_cart_not_empty(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::CartEmpty);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("077-065 4279"), "0770654279");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_customer_name_rules() {
        assert_eq!(validate_customer_name("  Nimal Perera ").unwrap(), "Nimal Perera");
        assert_eq!(
            validate_customer_name("").unwrap_err(),
            ValidationError::CustomerNameRequired
        );
        assert_eq!(
            validate_customer_name("Shop #4").unwrap_err(),
            ValidationError::CustomerNameInvalid
        );
    }

    #[test]
    fn test_customer_phone_rules() {
        assert_eq!(validate_customer_phone("").unwrap(), None);
        assert_eq!(
            validate_customer_phone("077 065 4279").unwrap(),
            Some("0770654279".to_string())
        );
        assert_eq!(
            validate_customer_phone("12345").unwrap_err(),
            ValidationError::CustomerPhoneInvalid
        );
    }

    #[test]
    fn test_cheque_date_shape() {
        assert!(is_cheque_date_format("2026-03-01"));
        assert!(!is_cheque_date_format("2026-3-1"));
        assert!(!is_cheque_date_format("01-03-2026"));
        assert!(!is_cheque_date_format(""));
        assert!(!is_cheque_date_format("2026-03-01x"));
    }

    #[test]
    fn test_cart_not_empty() {
        assert_eq!(
            validate_cart_not_empty(&[]).unwrap_err(),
            ValidationError::CartEmpty
        );
        assert!(validate_cart_not_empty(&[CartLine::default()]).is_ok());
    }
}
