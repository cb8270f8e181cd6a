//! # Discount Rule Engine
//!
//! Validates draft discounts against a [`DiscountPolicy`] and computes what a
//! set of discounts takes off an order.
//!
//! ## Call Sites
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin form ──► validate_discount_config ──► ValidationOutcome         │
//! │                        │                        │                       │
//! │                        │              valid: persist `corrected`        │
//! │                        │              invalid: show every error         │
//! │                                                                         │
//! │  Checkout ──► (filter by scope / window) ──► calculate_stacked_discount │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                  discount amount, never > order amount │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is synchronous and pure: the policy is borrowed, the
//! inputs are borrowed, and results are returned by value. Callers may share
//! one policy across threads freely.
//!
//! ## Example
//! ```rust
//! use maison_core::engine::{calculate_stacked_discount, validate_discount_config};
//! use maison_core::{DiscountConfig, DiscountPolicy, Money};
//!
//! let policy = DiscountPolicy::default();
//!
//! let draft = DiscountConfig::bottle_return(3);
//! let outcome = validate_discount_config(&draft, &policy);
//! assert!(outcome.is_valid());
//!
//! let off = calculate_stacked_discount(
//!     Money::from_minor(10000),
//!     &[DiscountConfig::percentage(15)],
//!     &policy,
//! );
//! assert_eq!(off.minor(), 1500);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{DiscountRuleError, RuleErrorKind};
use crate::money::Money;
use crate::policy::DiscountPolicy;
use crate::types::{CustomerTier, DiscountConfig, DiscountKind, Percent, StackedDiscountRequest};

// =============================================================================
// Validation
// =============================================================================

/// Result of checking one draft discount.
///
/// `corrected` is the config to persist: identical to the input except that a
/// bottle-return credit is replaced by the amount of its matching tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub errors: Vec<DiscountRuleError>,
    pub corrected: DiscountConfig,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable messages, in the order the checks ran.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Serializable form for the admin API.
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            is_valid: self.is_valid(),
            errors: self
                .errors
                .iter()
                .map(|err| RuleViolation {
                    kind: err.kind(),
                    message: err.to_string(),
                })
                .collect(),
            corrected: self.corrected.clone(),
        }
    }
}

/// One violation as sent to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RuleViolation {
    pub kind: RuleErrorKind,
    pub message: String,
}

/// JSON payload describing a validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<RuleViolation>,
    pub corrected: DiscountConfig,
}

/// Checks a draft discount against the policy.
///
/// ## Checks (all run; failures are collected)
/// 1. Percentage within `policy.percentage`
/// 2. Fixed amount within `policy.fixed_amount`
/// 3. Bottle count matches a tier, and independently lies within the
///    declared bottle-count bounds
/// 4. When both dates are set: the window is not negative and not longer
///    than the category's limit (regular as fallback). A window with only
///    one date is not checked.
///
/// Validating `outcome.corrected` again returns the same outcome.
pub fn validate_discount_config(
    config: &DiscountConfig,
    policy: &DiscountPolicy,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut corrected = config.clone();

    match config.kind {
        DiscountKind::Percentage { percent } => {
            if !policy.percentage.contains(percent) {
                errors.push(DiscountRuleError::PercentageOutOfRange {
                    value: percent,
                    min: policy.percentage.min,
                    max: policy.percentage.max,
                });
            }
        }
        DiscountKind::FixedAmount { amount } => {
            if !policy.fixed_amount.contains(amount) {
                errors.push(DiscountRuleError::FixedAmountOutOfRange {
                    value: amount,
                    min: policy.fixed_amount.min,
                    max: policy.fixed_amount.max,
                });
            }
        }
        DiscountKind::BottleReturn { bottles, .. } => {
            let rules = &policy.bottle_return;
            match rules.tier_for(bottles) {
                Some(tier) => {
                    corrected.kind = DiscountKind::BottleReturn {
                        bottles,
                        credit: tier.discount_amount,
                    };
                }
                None => errors.push(DiscountRuleError::InvalidTier { bottles }),
            }
            if !rules.count_in_bounds(bottles) {
                errors.push(DiscountRuleError::BottleCountOutOfRange {
                    bottles,
                    min: rules.min_bottle_count,
                    max: rules.max_bottle_count,
                });
            }
        }
    }

    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        let days = (end - start).num_days();
        let category = config.category_or_regular();
        if days < 0 {
            errors.push(DiscountRuleError::EndsBeforeStart { start, end });
        } else if let Some(max_days) = policy.temporal.max_days_for(category) {
            if days > max_days as i64 {
                errors.push(DiscountRuleError::DurationExceeded {
                    category: category.to_string(),
                    days,
                    max_days,
                });
            }
        }
    }

    if !errors.is_empty() {
        debug!(
            discount_id = %config.id,
            discount_type = %config.discount_type(),
            errors = errors.len(),
            "Discount config rejected"
        );
    }

    ValidationOutcome { errors, corrected }
}

// =============================================================================
// Calculation
// =============================================================================

/// One discount's share of a stacked calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AppliedDiscount {
    pub id: String,
    pub kind: DiscountKind,
    pub amount: Money,
}

/// Breakdown of a stacked discount calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StackedDiscount {
    pub base_amount: Money,
    /// Discounts that contributed, in application order.
    pub applied: Vec<AppliedDiscount>,
    /// Whether the combined-percentage cap cut the total.
    pub capped: bool,
    pub total: Money,
}

impl StackedDiscount {
    /// Order amount left to pay.
    pub fn remaining(&self) -> Money {
        self.base_amount.saturating_sub(self.total)
    }
}

/// What one discount takes off `remaining`, clamped to `[0, remaining]`.
///
/// Bottle returns use the tier table, not the advisory credit; an unknown
/// bottle count yields zero.
pub fn single_discount_amount(
    kind: &DiscountKind,
    remaining: Money,
    policy: &DiscountPolicy,
) -> Money {
    if !remaining.is_positive() {
        return Money::zero();
    }
    let raw = match *kind {
        DiscountKind::Percentage { percent } => remaining.percentage(percent),
        DiscountKind::FixedAmount { amount } => amount,
        DiscountKind::BottleReturn { bottles, .. } => policy
            .bottle_return
            .tier_for(bottles)
            .map_or(Money::zero(), |tier| tier.discount_amount),
    };
    raw.clamp_between(Money::zero(), remaining)
}

/// Total discount for `base` when `candidates` stack. Never fails.
///
/// Returns zero for a non-positive base or no candidates, and never more
/// than `base`. See [`stack_discounts`] for the rules.
pub fn calculate_stacked_discount(
    base: Money,
    candidates: &[DiscountConfig],
    policy: &DiscountPolicy,
) -> Money {
    stack(base, candidates, policy).total
}

/// Same as [`calculate_stacked_discount`] but keeps the breakdown.
///
/// ## Rules
/// - Stacking disabled: only the single largest discount applies (first
///   one wins a tie), computed against the full base.
/// - Stacking enabled: candidates are ordered percentage, fixed amount,
///   bottle return (stable within a type); at most
///   `max_stacked_discounts` apply, each against the amount remaining after
///   the previous ones.
/// - Once the running total reaches `max_combined_percentage` of the base,
///   it is set to exactly that share and later candidates are skipped.
pub fn stack_discounts(request: &StackedDiscountRequest, policy: &DiscountPolicy) -> StackedDiscount {
    stack(request.base_amount, &request.candidates, policy)
}

fn stack(base: Money, candidates: &[DiscountConfig], policy: &DiscountPolicy) -> StackedDiscount {
    let mut result = StackedDiscount {
        base_amount: base,
        ..StackedDiscount::default()
    };
    if !base.is_positive() || candidates.is_empty() {
        return result;
    }

    let rules = &policy.stacking;

    if !rules.allow_stacking {
        let mut best: Option<AppliedDiscount> = None;
        for candidate in candidates {
            let amount = single_discount_amount(&candidate.kind, base, policy);
            if best.as_ref().map_or(true, |b| amount > b.amount) {
                best = Some(applied(candidate, amount));
            }
        }
        if let Some(best) = best {
            result.total = best.amount.min(base);
            result.applied.push(best);
        }
        return result;
    }

    let mut ordered: Vec<&DiscountConfig> = candidates.iter().collect();
    ordered.sort_by_key(|c| c.discount_type());

    let cap = rules.max_combined_percentage;
    let mut remaining = base;
    let mut total = Money::zero();

    for candidate in ordered.into_iter().take(rules.max_stacked_discounts as usize) {
        let amount = single_discount_amount(&candidate.kind, remaining, policy);
        remaining -= amount;
        total += amount;
        result.applied.push(applied(candidate, amount));

        if reaches_cap(total, base, cap) {
            let clamped = base.percentage(cap);
            if let Some(last) = result.applied.last_mut() {
                last.amount -= total - clamped;
            }
            debug!(
                base = base.minor(),
                uncapped = total.minor(),
                capped = clamped.minor(),
                "Combined discount hit the stacking cap"
            );
            total = clamped;
            result.capped = true;
            break;
        }
    }

    result.total = total.min(base);
    result
}

/// `total / base * 100 > max`, compared exactly in integers. Nothing
/// exceeds a share of a non-positive base.
fn exceeds_share(total: Money, base: Money, max: Percent) -> bool {
    base.is_positive()
        && total.minor() as i128 * 10_000 > max.bps() as i128 * base.minor() as i128
}

/// `total / base * 100 >= cap`, compared exactly in integers.
fn reaches_cap(total: Money, base: Money, cap: Percent) -> bool {
    total.minor() as i128 * 10_000 >= cap.bps() as i128 * base.minor() as i128
}

fn applied(config: &DiscountConfig, amount: Money) -> AppliedDiscount {
    AppliedDiscount {
        id: config.id.clone(),
        kind: config.kind,
        amount,
    }
}

// =============================================================================
// Compatibility
// =============================================================================

/// Whether `new` may join `existing` under the count rule.
///
/// Counts existing discounts whose scope overlaps the new one (same scope,
/// or either side is `all`) and allows the new one while that count is
/// below `max_stacked_discounts`. Discount types are not considered; see
/// [`validate_type_compatibility`].
pub fn validate_stacking_compatibility(
    existing: &[DiscountConfig],
    new: &DiscountConfig,
    policy: &DiscountPolicy,
) -> bool {
    if !policy.stacking.allow_stacking {
        return false;
    }
    let overlapping = existing
        .iter()
        .filter(|d| d.scope.overlaps(&new.scope))
        .count();
    overlapping < policy.stacking.max_stacked_discounts as usize
}

/// Whether `new` may combine with every discount in `existing` according to
/// the stacking matrix, checked in both directions.
///
/// Independent of [`validate_stacking_compatibility`]; callers decide
/// whether to apply one or both.
pub fn validate_type_compatibility(
    existing: &[DiscountConfig],
    new: &DiscountConfig,
    policy: &DiscountPolicy,
) -> bool {
    if !policy.stacking.allow_stacking {
        return false;
    }
    let new_type = new.discount_type();
    existing.iter().all(|d| {
        let other = d.discount_type();
        policy.stacking.allows(new_type, other) && policy.stacking.allows(other, new_type)
    })
}

// =============================================================================
// Customer Tier Limits
// =============================================================================

/// Checks a set of discounts against the customer's tier ceiling.
///
/// The effective percentage is the stacked total over `base`. A tier with
/// no entry in the policy has no limits.
pub fn check_customer_tier(
    tier: CustomerTier,
    discounts: &[DiscountConfig],
    base: Money,
    policy: &DiscountPolicy,
) -> Vec<DiscountRuleError> {
    let mut violations = Vec::new();
    let Some(limit) = policy.customer_tiers.get(&tier) else {
        return violations;
    };

    if discounts.len() > limit.max_concurrent_discounts as usize {
        violations.push(DiscountRuleError::TooManyConcurrent {
            tier,
            count: discounts.len(),
            max: limit.max_concurrent_discounts,
        });
    }

    let total = calculate_stacked_discount(base, discounts, policy);
    if exceeds_share(total, base, limit.max_discount_percentage) {
        let effective = Percent::ratio(total, base);
        violations.push(DiscountRuleError::TierDiscountExceeded {
            tier,
            effective,
            max: limit.max_discount_percentage,
        });
    }

    violations
}

// =============================================================================
// Unit Tests
// =============================================================================
