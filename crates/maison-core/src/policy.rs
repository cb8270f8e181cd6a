//! # Discount Policy
//!
//! The immutable business-rule tables every discount is checked against.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup:  defaults ──► policy.toml ──► env overrides ──► validate()   │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │  runtime:              &DiscountPolicy passed into every engine call   │
//! │                        (never mutated; reload = restart)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loading half lives in `maison-policy`; this module only defines the
//! tables, their defaults and their internal consistency rules.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CustomerTier, DiscountType, Percent, REGULAR_CATEGORY};
use crate::validation::{validate_bounds, validate_category, validate_in_range, validate_label};

// =============================================================================
// Bounds
// =============================================================================

/// Allowed range for percentage discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageBounds {
    pub min: Percent,
    pub max: Percent,
}

impl PercentageBounds {
    pub fn contains(&self, value: Percent) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Allowed range for fixed-amount discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAmountBounds {
    pub min: Money,
    pub max: Money,
}

impl FixedAmountBounds {
    pub fn contains(&self, value: Money) -> bool {
        self.min <= value && value <= self.max
    }
}

// =============================================================================
// Bottle Return
// =============================================================================

/// One accepted bottle count and the credit it earns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleReturnTier {
    pub bottle_count: u32,
    pub discount_amount: Money,
    pub label: String,
}

/// Bottle-return incentive table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleReturnRules {
    pub min_bottle_count: u32,
    pub max_bottle_count: u32,
    pub tiers: Vec<BottleReturnTier>,
}

impl BottleReturnRules {
    /// Exact-match tier lookup.
    pub fn tier_for(&self, bottles: u32) -> Option<&BottleReturnTier> {
        self.tiers.iter().find(|tier| tier.bottle_count == bottles)
    }

    pub fn count_in_bounds(&self, bottles: u32) -> bool {
        self.min_bottle_count <= bottles && bottles <= self.max_bottle_count
    }
}

// =============================================================================
// Customer Tiers
// =============================================================================

/// Ceiling on what one customer tier may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimit {
    pub max_discount_percentage: Percent,
    pub max_concurrent_discounts: u32,
}

// =============================================================================
// Stacking
// =============================================================================

/// Rules for combining discounts on one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackingRules {
    pub allow_stacking: bool,
    pub max_stacked_discounts: u32,
    pub max_combined_percentage: Percent,
    /// Which types each type may be combined with.
    pub stacking_matrix: BTreeMap<DiscountType, BTreeSet<DiscountType>>,
}

impl StackingRules {
    /// One-directional matrix lookup; a missing row allows nothing.
    pub fn allows(&self, from: DiscountType, with: DiscountType) -> bool {
        self.stacking_matrix
            .get(&from)
            .map_or(false, |allowed| allowed.contains(&with))
    }
}

// =============================================================================
// Temporal
// =============================================================================

/// Longest validity window per discount category, in days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalRules {
    pub max_duration_days: BTreeMap<String, u32>,
}

impl TemporalRules {
    /// Limit for `category`, falling back to the regular category.
    pub fn max_days_for(&self, category: &str) -> Option<u32> {
        self.max_duration_days
            .get(category)
            .or_else(|| self.max_duration_days.get(REGULAR_CATEGORY))
            .copied()
    }
}

// =============================================================================
// Discount Policy
// =============================================================================

/// All discount business rules, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountPolicy {
    pub percentage: PercentageBounds,
    pub fixed_amount: FixedAmountBounds,
    pub bottle_return: BottleReturnRules,
    pub customer_tiers: BTreeMap<CustomerTier, TierLimit>,
    pub stacking: StackingRules,
    pub temporal: TemporalRules,
}

impl DiscountPolicy {
    /// Checks that the tables do not contradict each other.
    ///
    /// ## Rules
    /// - Every min/max pair is ordered
    /// - Tier bottle counts are unique, labelled, and inside the count bounds
    /// - `max_stacked_discounts` is at least 1
    /// - `max_combined_percentage` is at most 100%
    /// - A `regular` temporal entry exists and every category name is valid
    pub fn validate(&self) -> CoreResult<()> {
        validate_bounds(
            "percentage",
            self.percentage.min.bps() as i64,
            self.percentage.max.bps() as i64,
        )?;
        validate_in_range(
            "percentage.max",
            self.percentage.max.bps() as i64,
            0,
            Percent::FULL.bps() as i64,
        )?;
        validate_bounds(
            "fixed amount",
            self.fixed_amount.min.minor(),
            self.fixed_amount.max.minor(),
        )?;
        validate_bounds(
            "bottle count",
            self.bottle_return.min_bottle_count as i64,
            self.bottle_return.max_bottle_count as i64,
        )?;

        let mut seen = HashSet::new();
        for tier in &self.bottle_return.tiers {
            validate_label("tier label", &tier.label)?;
            if !seen.insert(tier.bottle_count) {
                return Err(ValidationError::Duplicate {
                    field: "bottle return tier".to_string(),
                    value: tier.bottle_count.to_string(),
                }
                .into());
            }
            if !self.bottle_return.count_in_bounds(tier.bottle_count) {
                return Err(CoreError::InvalidPolicy(format!(
                    "tier for {} bottles lies outside {}..={}",
                    tier.bottle_count,
                    self.bottle_return.min_bottle_count,
                    self.bottle_return.max_bottle_count
                )));
            }
            if tier.discount_amount.is_negative() {
                return Err(CoreError::InvalidPolicy(format!(
                    "tier for {} bottles has a negative amount",
                    tier.bottle_count
                )));
            }
        }

        if self.stacking.max_stacked_discounts == 0 {
            return Err(CoreError::InvalidPolicy(
                "max_stacked_discounts must be at least 1".into(),
            ));
        }
        validate_in_range(
            "max combined percentage",
            self.stacking.max_combined_percentage.bps() as i64,
            0,
            Percent::FULL.bps() as i64,
        )?;

        if !self.temporal.max_duration_days.contains_key(REGULAR_CATEGORY) {
            return Err(CoreError::InvalidPolicy(format!(
                "temporal rules need a '{}' entry",
                REGULAR_CATEGORY
            )));
        }
        for category in self.temporal.max_duration_days.keys() {
            validate_category(category)?;
        }

        Ok(())
    }
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        let tiers: Vec<BottleReturnTier> = (1..=5)
            .map(|count| BottleReturnTier {
                bottle_count: count,
                discount_amount: Money::from_minor(1000 * count as i64),
                label: if count == 1 {
                    "1 bottle returned".to_string()
                } else {
                    format!("{} bottles returned", count)
                },
            })
            .collect();

        let customer_tiers: BTreeMap<CustomerTier, TierLimit> = [
            (CustomerTier::Bronze, 5, 1),
            (CustomerTier::Silver, 10, 2),
            (CustomerTier::Gold, 15, 2),
            (CustomerTier::Platinum, 20, 3),
            (CustomerTier::Vip, 30, 3),
        ]
        .into_iter()
        .map(|(tier, points, concurrent)| {
            (
                tier,
                TierLimit {
                    max_discount_percentage: Percent::from_points(points),
                    max_concurrent_discounts: concurrent,
                },
            )
        })
        .collect();

        // Every type combines with every other type, including itself.
        let stacking_matrix: BTreeMap<DiscountType, BTreeSet<DiscountType>> = DiscountType::ALL
            .iter()
            .map(|t| (*t, DiscountType::ALL.iter().copied().collect()))
            .collect();

        let max_duration_days: BTreeMap<String, u32> = [
            (REGULAR_CATEGORY, 30),
            ("seasonal", 90),
            ("clearance", 60),
            ("flash", 3),
        ]
        .into_iter()
        .map(|(category, days)| (category.to_string(), days))
        .collect();

        DiscountPolicy {
            percentage: PercentageBounds {
                min: Percent::from_points(1),
                max: Percent::from_points(50),
            },
            fixed_amount: FixedAmountBounds {
                min: Money::from_minor(100),
                max: Money::from_minor(100_000),
            },
            bottle_return: BottleReturnRules {
                min_bottle_count: 1,
                max_bottle_count: 5,
                tiers,
            },
            customer_tiers,
            stacking: StackingRules {
                allow_stacking: true,
                max_stacked_discounts: 3,
                max_combined_percentage: Percent::from_points(50),
                stacking_matrix,
            },
            temporal: TemporalRules { max_duration_days },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = DiscountPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.bottle_return.tiers.len(), 5);
        assert_eq!(policy.customer_tiers.len(), 5);
    }

    #[test]
    fn test_tier_lookup() {
        let policy = DiscountPolicy::default();
        let tier = policy.bottle_return.tier_for(3).unwrap();
        assert_eq!(tier.discount_amount, Money::from_minor(3000));
        assert_eq!(tier.label, "3 bottles returned");
        assert!(policy.bottle_return.tier_for(7).is_none());
    }

    #[test]
    fn test_temporal_fallback_to_regular() {
        let policy = DiscountPolicy::default();
        assert_eq!(policy.temporal.max_days_for("flash"), Some(3));
        assert_eq!(policy.temporal.max_days_for("anniversary"), Some(30));
    }

    #[test]
    fn test_matrix_lookup() {
        let mut policy = DiscountPolicy::default();
        assert!(policy
            .stacking
            .allows(DiscountType::Percentage, DiscountType::BottleReturn));

        policy.stacking.stacking_matrix.remove(&DiscountType::Percentage);
        assert!(!policy
            .stacking
            .allows(DiscountType::Percentage, DiscountType::BottleReturn));
    }

    #[test]
    fn test_validate_rejects_duplicate_tiers() {
        let mut policy = DiscountPolicy::default();
        let dup = policy.bottle_return.tiers[0].clone();
        policy.bottle_return.tiers.push(dup);
        let err = policy.validate().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { ref value, .. }) if value == "1"
        ));
        assert_eq!(
            err.to_string(),
            "Validation error: bottle return tier '1' already exists"
        );
    }

    #[test]
    fn test_validate_rejects_tier_outside_bounds() {
        let mut policy = DiscountPolicy::default();
        policy.bottle_return.max_bottle_count = 4;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_percentage() {
        let mut policy = DiscountPolicy::default();
        policy.percentage.min = Percent::from_points(60);
        assert!(matches!(policy.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_validate_requires_regular_category() {
        let mut policy = DiscountPolicy::default();
        policy.temporal.max_duration_days.remove(REGULAR_CATEGORY);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_stack_size() {
        let mut policy = DiscountPolicy::default();
        policy.stacking.max_stacked_discounts = 0;
        assert!(policy.validate().is_err());
    }
}
