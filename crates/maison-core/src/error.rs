//! # Error Types
//!
//! Domain-specific error types for maison-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  maison-core errors (this file)                                        │
//! │  ├── DiscountRuleError - a discount breaks a policy rule               │
//! │  │                       (collected, never short-circuited)            │
//! │  ├── CoreError         - bottling / policy consistency failures        │
//! │  └── ValidationError   - input field validation failures               │
//! │                                                                         │
//! │  maison-policy errors (separate crate)                                 │
//! │  └── PolicyError       - file, TOML and environment failures           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (value, bound, tier)
//! 3. Every rule violation maps to one machine-readable [`RuleErrorKind`]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CustomerTier, Percent};

// =============================================================================
// Rule Error Kind
// =============================================================================

/// Machine-distinguishable category of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RuleErrorKind {
    /// A percentage, fixed amount or bottle count is outside policy bounds.
    OutOfRange,
    /// A bottle count matches no configured tier.
    InvalidTier,
    /// The validity window is too long or ends before it starts.
    DurationExceeded,
    /// A customer tier's discount ceiling or concurrency limit is exceeded.
    TierLimitExceeded,
}

impl fmt::Display for RuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleErrorKind::OutOfRange => write!(f, "OUT_OF_RANGE"),
            RuleErrorKind::InvalidTier => write!(f, "INVALID_TIER"),
            RuleErrorKind::DurationExceeded => write!(f, "DURATION_EXCEEDED"),
            RuleErrorKind::TierLimitExceeded => write!(f, "TIER_LIMIT_EXCEEDED"),
        }
    }
}

// =============================================================================
// Discount Rule Error
// =============================================================================

/// A discount configuration breaking one policy rule.
///
/// Validation gathers every violation so the admin screen can show all
/// problems at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountRuleError {
    #[error("percentage {value} must be between {min} and {max}")]
    PercentageOutOfRange {
        value: Percent,
        min: Percent,
        max: Percent,
    },

    #[error("fixed amount {value} must be between {min} and {max}")]
    FixedAmountOutOfRange { value: Money, min: Money, max: Money },

    #[error("bottle return count {bottles} must be between {min} and {max}")]
    BottleCountOutOfRange { bottles: u32, min: u32, max: u32 },

    #[error("no bottle return tier for {bottles} bottles")]
    InvalidTier { bottles: u32 },

    #[error("end date {end} is before start date {start}")]
    EndsBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("{category} discounts may run at most {max_days} days, got {days}")]
    DurationExceeded {
        category: String,
        days: i64,
        max_days: u32,
    },

    #[error("{tier} customers may receive at most {max} off, got {effective}")]
    TierDiscountExceeded {
        tier: CustomerTier,
        effective: Percent,
        max: Percent,
    },

    #[error("{tier} customers may combine at most {max} discounts, got {count}")]
    TooManyConcurrent {
        tier: CustomerTier,
        count: usize,
        max: u32,
    },
}

impl DiscountRuleError {
    /// The machine-readable category of this violation.
    pub fn kind(&self) -> RuleErrorKind {
        match self {
            DiscountRuleError::PercentageOutOfRange { .. }
            | DiscountRuleError::FixedAmountOutOfRange { .. }
            | DiscountRuleError::BottleCountOutOfRange { .. } => RuleErrorKind::OutOfRange,
            DiscountRuleError::InvalidTier { .. } => RuleErrorKind::InvalidTier,
            DiscountRuleError::EndsBeforeStart { .. }
            | DiscountRuleError::DurationExceeded { .. } => RuleErrorKind::DurationExceeded,
            DiscountRuleError::TierDiscountExceeded { .. }
            | DiscountRuleError::TooManyConcurrent { .. } => RuleErrorKind::TierLimitExceeded,
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough bulk perfume to fill the requested bottles.
    #[error("Insufficient bulk stock: required {required_ml} ml, available {available_ml} ml")]
    InsufficientStock { required_ml: u64, available_ml: u64 },

    /// An amount left the representable range.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// The policy tables contradict each other.
    #[error("Invalid discount policy: {0}")]
    InvalidPolicy(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Lower bound above upper bound.
    #[error("{field} minimum {min} exceeds maximum {max}")]
    InvertedBounds { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate tier bottle count).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_error_messages() {
        let err = DiscountRuleError::PercentageOutOfRange {
            value: Percent::from_points(60),
            min: Percent::from_points(1),
            max: Percent::from_points(50),
        };
        assert_eq!(err.to_string(), "percentage 60% must be between 1% and 50%");
        assert_eq!(err.kind(), RuleErrorKind::OutOfRange);

        let err = DiscountRuleError::InvalidTier { bottles: 7 };
        assert_eq!(err.to_string(), "no bottle return tier for 7 bottles");
        assert_eq!(err.kind(), RuleErrorKind::InvalidTier);
    }

    #[test]
    fn test_date_errors_share_kind() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let err = DiscountRuleError::EndsBeforeStart { start, end };
        assert_eq!(err.kind(), RuleErrorKind::DurationExceeded);
        assert_eq!(
            err.to_string(),
            "end date 2024-01-05 is before start date 2024-01-10"
        );
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&RuleErrorKind::DurationExceeded).unwrap();
        assert_eq!(json, "\"DURATION_EXCEEDED\"");
        assert_eq!(RuleErrorKind::InvalidTier.to_string(), "INVALID_TIER");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "label".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
