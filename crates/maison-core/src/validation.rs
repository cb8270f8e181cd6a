//! # Validation Module
//!
//! Field-level validators shared by the policy tables and bottling math.
//!
//! Discount *rule* checks live in [`crate::engine`]; this module only answers
//! "is this field well-formed", one error at a time.
//!
//! ## Usage
//! ```rust
//! use maison_core::validation::{validate_bounds, validate_category};
//!
//! assert!(validate_bounds("percentage", 100, 5000).is_ok());
//! assert!(validate_category("seasonal").is_ok());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted label or category name.
pub const MAX_LABEL_LEN: usize = 100;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Checks that a `[min, max]` pair is not inverted.
pub fn validate_bounds(field: &str, min: i64, max: i64) -> ValidationResult<()> {
    if min > max {
        return Err(ValidationError::InvertedBounds {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Checks that `value` is strictly positive.
pub fn validate_positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Checks that `value` lies within `[min, max]`.
pub fn validate_in_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display label (tier labels, product names).
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_LABEL_LEN`] characters
pub fn validate_label(field: &str, label: &str) -> ValidationResult<()> {
    let label = label.trim();

    if label.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if label.chars().count() > MAX_LABEL_LEN {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LABEL_LEN as i64,
        });
    }

    Ok(())
}

/// Validates a discount category name used as a temporal-rules key.
///
/// ## Rules
/// - Must not be blank
/// - Letters, numbers, hyphens and underscores only
///
/// ```rust
/// use maison_core::validation::validate_category;
///
/// assert!(validate_category("flash_sale").is_ok());
/// assert!(validate_category("flash sale").is_err());
/// ```
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_label("category", category)?;

    if !category
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "category".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
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
    fn test_validate_bounds() {
        assert!(validate_bounds("percentage", 1, 50).is_ok());
        assert!(validate_bounds("percentage", 50, 50).is_ok());
        assert!(matches!(
            validate_bounds("percentage", 60, 50),
            Err(ValidationError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_validate_positive_and_range() {
        assert!(validate_positive("bottle size", 50).is_ok());
        assert!(validate_positive("bottle size", 0).is_err());
        assert!(validate_in_range("bottles", 3, 1, 5).is_ok());
        assert!(validate_in_range("bottles", 6, 1, 5).is_err());
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("label", "3 bottles returned").is_ok());
        assert!(validate_label("label", "   ").is_err());
        assert!(validate_label("label", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("regular").is_ok());
        assert!(validate_category("flash-sale").is_ok());
        assert!(validate_category("").is_err());
        assert!(validate_category("flash sale!").is_err());
    }
}
