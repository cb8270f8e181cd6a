//! # Policy Configuration
//!
//! Builds the process-wide [`DiscountPolicy`] at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MAISON_ALLOW_STACKING=false                                        │
//! │     MAISON_MAX_STACKED_DISCOUNTS=2                                     │
//! │     MAISON_MAX_COMBINED_PERCENTAGE=40                                  │
//! │                                                                         │
//! │  2. TOML Policy File                                                   │
//! │     explicit --policy path, else $MAISON_POLICY_PATH, else             │
//! │     ~/.config/maison/policy.toml (Linux)                               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     DiscountPolicy::default()                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Policy File Format
//! Every section and key is optional; anything missing keeps its default.
//! ```toml
//! [percentage]
//! minPercentage = 1
//! maxPercentage = 50
//!
//! [fixedAmount]
//! minAmount = 100
//! maxAmount = 100000
//!
//! [bottleReturn]
//! minBottleCount = 1
//! maxBottleCount = 4
//! tiers = [
//!     { bottleCount = 1, discountAmount = 1000, label = "1 bottle returned" },
//!     { bottleCount = 2, discountAmount = 2000, label = "2 bottles returned" },
//! ]
//!
//! [customerTiers.gold]
//! maxDiscountPercentage = 15
//! maxConcurrentDiscounts = 2
//!
//! [stacking]
//! allowStacking = true
//! maxStackedDiscounts = 3
//! maxCombinedPercentage = 50
//! stackingMatrix = { percentage = ["fixed_amount", "bottle_return"] }
//!
//! [temporal.maxDurationDays]
//! regular = 30
//! flash = 3
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;

use maison_core::policy::{BottleReturnTier, DiscountPolicy, TierLimit};
use maison_core::{CustomerTier, DiscountType, Money, Percent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PolicyError, PolicyResult};

pub const POLICY_PATH_ENV: &str = "MAISON_POLICY_PATH";
pub const ALLOW_STACKING_ENV: &str = "MAISON_ALLOW_STACKING";
pub const MAX_STACKED_ENV: &str = "MAISON_MAX_STACKED_DISCOUNTS";
pub const MAX_COMBINED_ENV: &str = "MAISON_MAX_COMBINED_PERCENTAGE";

// =============================================================================
// File Schema
// =============================================================================

/// On-disk shape of `policy.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<PercentageSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_amount: Option<FixedAmountSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottle_return: Option<BottleReturnSection>,

    /// Keyed by tier name (`bronze`, `silver`, `gold`, `platinum`, `vip`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub customer_tiers: BTreeMap<String, TierSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<StackingSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalSection>,
}

/// Percentages are written as points (`12.5` = 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PercentageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedAmountSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BottleReturnSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bottle_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bottle_count: Option<u32>,
    /// Replaces the whole default tier table when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<TierEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEntry {
    pub bottle_count: u32,
    pub discount_amount: i64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_discounts: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_stacking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stacked_discounts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_combined_percentage: Option<f64>,
    /// Replaces the whole default matrix when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking_matrix: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemporalSection {
    /// Merged over the default categories.
    pub max_duration_days: BTreeMap<String, u32>,
}

impl PolicyFile {
    /// Overlays this file onto `policy`.
    ///
    /// Fails on unknown tier or discount type names; consistency is checked
    /// separately by [`DiscountPolicy::validate`].
    pub fn apply(&self, policy: &mut DiscountPolicy) -> PolicyResult<()> {
        if let Some(section) = &self.percentage {
            if let Some(min) = section.min_percentage {
                policy.percentage.min = Percent::from_percentage(min);
            }
            if let Some(max) = section.max_percentage {
                policy.percentage.max = Percent::from_percentage(max);
            }
        }

        if let Some(section) = &self.fixed_amount {
            if let Some(min) = section.min_amount {
                policy.fixed_amount.min = Money::from_minor(min);
            }
            if let Some(max) = section.max_amount {
                policy.fixed_amount.max = Money::from_minor(max);
            }
        }

        if let Some(section) = &self.bottle_return {
            let rules = &mut policy.bottle_return;
            if let Some(min) = section.min_bottle_count {
                rules.min_bottle_count = min;
            }
            if let Some(max) = section.max_bottle_count {
                rules.max_bottle_count = max;
            }
            if let Some(tiers) = &section.tiers {
                rules.tiers = tiers
                    .iter()
                    .map(|t| BottleReturnTier {
                        bottle_count: t.bottle_count,
                        discount_amount: Money::from_minor(t.discount_amount),
                        label: t.label.clone(),
                    })
                    .collect();
            }
        }

        for (name, section) in &self.customer_tiers {
            let tier = CustomerTier::from_str(name)?;
            let limit = policy.customer_tiers.entry(tier).or_insert(TierLimit {
                max_discount_percentage: Percent::zero(),
                max_concurrent_discounts: 1,
            });
            if let Some(pct) = section.max_discount_percentage {
                limit.max_discount_percentage = Percent::from_percentage(pct);
            }
            if let Some(max) = section.max_concurrent_discounts {
                limit.max_concurrent_discounts = max;
            }
        }

        if let Some(section) = &self.stacking {
            let rules = &mut policy.stacking;
            if let Some(allow) = section.allow_stacking {
                rules.allow_stacking = allow;
            }
            if let Some(max) = section.max_stacked_discounts {
                rules.max_stacked_discounts = max;
            }
            if let Some(pct) = section.max_combined_percentage {
                rules.max_combined_percentage = Percent::from_percentage(pct);
            }
            if let Some(matrix) = &section.stacking_matrix {
                let mut parsed = BTreeMap::new();
                for (from, with) in matrix {
                    let from = DiscountType::from_str(from)?;
                    let with = with
                        .iter()
                        .map(|t| DiscountType::from_str(t))
                        .collect::<Result<BTreeSet<_>, _>>()?;
                    parsed.insert(from, with);
                }
                rules.stacking_matrix = parsed;
            }
        }

        if let Some(section) = &self.temporal {
            for (category, days) in &section.max_duration_days {
                policy
                    .temporal
                    .max_duration_days
                    .insert(category.clone(), *days);
            }
        }

        Ok(())
    }
}

impl From<&DiscountPolicy> for PolicyFile {
    fn from(policy: &DiscountPolicy) -> Self {
        PolicyFile {
            percentage: Some(PercentageSection {
                min_percentage: Some(policy.percentage.min.percentage()),
                max_percentage: Some(policy.percentage.max.percentage()),
            }),
            fixed_amount: Some(FixedAmountSection {
                min_amount: Some(policy.fixed_amount.min.minor()),
                max_amount: Some(policy.fixed_amount.max.minor()),
            }),
            bottle_return: Some(BottleReturnSection {
                min_bottle_count: Some(policy.bottle_return.min_bottle_count),
                max_bottle_count: Some(policy.bottle_return.max_bottle_count),
                tiers: Some(
                    policy
                        .bottle_return
                        .tiers
                        .iter()
                        .map(|t| TierEntry {
                            bottle_count: t.bottle_count,
                            discount_amount: t.discount_amount.minor(),
                            label: t.label.clone(),
                        })
                        .collect(),
                ),
            }),
            customer_tiers: policy
                .customer_tiers
                .iter()
                .map(|(tier, limit)| {
                    (
                        tier.to_string(),
                        TierSection {
                            max_discount_percentage: Some(limit.max_discount_percentage.percentage()),
                            max_concurrent_discounts: Some(limit.max_concurrent_discounts),
                        },
                    )
                })
                .collect(),
            stacking: Some(StackingSection {
                allow_stacking: Some(policy.stacking.allow_stacking),
                max_stacked_discounts: Some(policy.stacking.max_stacked_discounts),
                max_combined_percentage: Some(policy.stacking.max_combined_percentage.percentage()),
                stacking_matrix: Some(
                    policy
                        .stacking
                        .stacking_matrix
                        .iter()
                        .map(|(from, with)| {
                            (
                                from.to_string(),
                                with.iter().map(|t| t.to_string()).collect(),
                            )
                        })
                        .collect(),
                ),
            }),
            temporal: Some(TemporalSection {
                max_duration_days: policy.temporal.max_duration_days.clone(),
            }),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads the policy from defaults, file and environment, then validates it.
///
/// A missing file is not an error; the defaults are used.
pub fn load_policy(config_path: Option<PathBuf>) -> PolicyResult<DiscountPolicy> {
    load_policy_with(config_path, |key| std::env::var(key).ok())
}

/// [`load_policy`] with overrides read through `lookup` instead of the
/// process environment.
pub fn load_policy_with<F>(config_path: Option<PathBuf>, lookup: F) -> PolicyResult<DiscountPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let mut policy = DiscountPolicy::default();

    if let Some(path) = config_path.or_else(default_policy_path) {
        if path.exists() {
            info!(?path, "Loading discount policy from file");
            let contents = std::fs::read_to_string(&path)?;
            let file: PolicyFile = toml::from_str(&contents)?;
            file.apply(&mut policy)?;
        } else {
            debug!(?path, "Policy file not found, using defaults");
        }
    }

    apply_overrides(&mut policy, lookup)?;
    policy.validate()?;

    info!(
        allow_stacking = policy.stacking.allow_stacking,
        max_stacked = policy.stacking.max_stacked_discounts,
        bottle_tiers = policy.bottle_return.tiers.len(),
        "Discount policy ready"
    );
    Ok(policy)
}

/// Loads the policy or falls back to the defaults.
pub fn load_policy_or_default(config_path: Option<PathBuf>) -> DiscountPolicy {
    load_policy(config_path).unwrap_or_else(|e| {
        warn!("Failed to load discount policy: {}. Using defaults.", e);
        DiscountPolicy::default()
    })
}

/// Builds a policy from TOML text over the defaults, without consulting the
/// environment.
pub fn parse_policy(contents: &str) -> PolicyResult<DiscountPolicy> {
    let mut policy = DiscountPolicy::default();
    let file: PolicyFile = toml::from_str(contents)?;
    file.apply(&mut policy)?;
    policy.validate()?;
    Ok(policy)
}

/// Writes the policy as TOML and returns the path written.
pub fn save_policy(policy: &DiscountPolicy, config_path: Option<PathBuf>) -> PolicyResult<PathBuf> {
    let path = config_path
        .or_else(default_policy_path)
        .ok_or(PolicyError::NoConfigPath)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(&PolicyFile::from(policy))?;
    std::fs::write(&path, contents)?;

    info!(?path, "Discount policy saved");
    Ok(path)
}

/// Applies `MAISON_*` overrides read through `lookup`.
pub fn apply_overrides<F>(policy: &mut DiscountPolicy, lookup: F) -> PolicyResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ALLOW_STACKING_ENV) {
        let allow = match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => return Err(invalid(ALLOW_STACKING_ENV, &value)),
        };
        debug!(allow, "Overriding allow_stacking from environment");
        policy.stacking.allow_stacking = allow;
    }

    if let Some(value) = lookup(MAX_STACKED_ENV) {
        let max = value
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(MAX_STACKED_ENV, &value))?;
        debug!(max, "Overriding max_stacked_discounts from environment");
        policy.stacking.max_stacked_discounts = max;
    }

    if let Some(value) = lookup(MAX_COMBINED_ENV) {
        let pct = value
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(MAX_COMBINED_ENV, &value))?;
        debug!(pct, "Overriding max_combined_percentage from environment");
        policy.stacking.max_combined_percentage = Percent::from_percentage(pct);
    }

    Ok(())
}

fn invalid(key: &str, value: &str) -> PolicyError {
    PolicyError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// `$MAISON_POLICY_PATH`, else the platform config directory.
pub fn default_policy_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(POLICY_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    directories::ProjectDirs::from("com", "maison", "maison")
        .map(|dirs| dirs.config_dir().join("policy.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[percentage]
minPercentage = 5
maxPercentage = 40

[bottleReturn]
minBottleCount = 1
maxBottleCount = 4
tiers = [
    { bottleCount = 1, discountAmount = 1000, label = "one" },
    { bottleCount = 2, discountAmount = 2000, label = "two" },
    { bottleCount = 3, discountAmount = 3000, label = "three" },
    { bottleCount = 4, discountAmount = 4000, label = "four" },
]

[customerTiers.vip]
maxDiscountPercentage = 35

[stacking]
allowStacking = false
stackingMatrix = { percentage = ["fixed_amount"], fixed_amount = ["percentage"] }

[temporal.maxDurationDays]
flash = 2
weekend = 3
"#;

    #[test]
    fn test_parse_sample_file() {
        let policy = parse_policy(SAMPLE).unwrap();

        assert_eq!(policy.percentage.min, Percent::from_points(5));
        assert_eq!(policy.percentage.max, Percent::from_points(40));
        assert_eq!(policy.bottle_return.tiers.len(), 4);
        assert_eq!(
            policy.bottle_return.tier_for(4).unwrap().discount_amount,
            Money::from_minor(4000)
        );
        assert!(!policy.stacking.allow_stacking);
        assert!(policy
            .stacking
            .allows(DiscountType::Percentage, DiscountType::FixedAmount));
        assert!(!policy
            .stacking
            .allows(DiscountType::BottleReturn, DiscountType::Percentage));

        let vip = policy.customer_tiers[&CustomerTier::Vip];
        assert_eq!(vip.max_discount_percentage, Percent::from_points(35));
        assert_eq!(vip.max_concurrent_discounts, 3); // default kept

        assert_eq!(policy.temporal.max_days_for("flash"), Some(2));
        assert_eq!(policy.temporal.max_days_for("weekend"), Some(3));
        assert_eq!(policy.temporal.max_days_for("regular"), Some(30));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_policy("").unwrap(), DiscountPolicy::default());
    }

    #[test]
    fn test_unknown_names_rejected() {
        let err = parse_policy("[customerTiers.diamond]\nmaxDiscountPercentage = 10\n").unwrap_err();
        assert!(matches!(err, PolicyError::UnknownName(_)));

        let err = parse_policy("[stacking]\nstackingMatrix = { coupon = [\"percentage\"] }\n")
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownName(_)));
    }

    #[test]
    fn test_inconsistent_policy_rejected() {
        let err = parse_policy("[percentage]\nminPercentage = 60\nmaxPercentage = 10\n").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPolicy(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(matches!(parse_policy("[stacking"), Err(PolicyError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ALLOW_STACKING_ENV, "off"),
            (MAX_STACKED_ENV, "2"),
            (MAX_COMBINED_ENV, "37.5"),
        ]
        .into_iter()
        .collect();

        let mut policy = DiscountPolicy::default();
        apply_overrides(&mut policy, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert!(!policy.stacking.allow_stacking);
        assert_eq!(policy.stacking.max_stacked_discounts, 2);
        assert_eq!(policy.stacking.max_combined_percentage, Percent::from_bps(3750));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut policy = DiscountPolicy::default();
        let err = apply_overrides(&mut policy, |key| {
            (key == MAX_STACKED_ENV).then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidValue { .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let policy = DiscountPolicy::default();
        let text = toml::to_string_pretty(&PolicyFile::from(&policy)).unwrap();
        assert!(text.contains("[stacking]"));
        assert!(text.contains("maxCombinedPercentage"));
        assert_eq!(parse_policy(&text).unwrap(), policy);
    }

    fn temp_policy_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("maison-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_load_layers_file_then_env() {
        let dir = temp_policy_dir("layers");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("policy.toml");
        std::fs::write(
            &path,
            "[stacking]\nmaxStackedDiscounts = 2\nmaxCombinedPercentage = 40\n",
        )
        .unwrap();

        // file over defaults
        let policy = load_policy_with(Some(path.clone()), |_| None).unwrap();
        assert_eq!(policy.stacking.max_stacked_discounts, 2);
        assert_eq!(policy.stacking.max_combined_percentage, Percent::from_points(40));
        assert_eq!(policy.percentage, DiscountPolicy::default().percentage);

        // env over file
        let policy = load_policy_with(Some(path.clone()), |key| {
            (key == MAX_STACKED_ENV).then(|| "1".to_string())
        })
        .unwrap();
        assert_eq!(policy.stacking.max_stacked_discounts, 1);
        assert_eq!(policy.stacking.max_combined_percentage, Percent::from_points(40));

        // validation runs after the overrides
        let err = load_policy_with(Some(path), |key| {
            (key == MAX_COMBINED_ENV).then(|| "150".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPolicy(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = temp_policy_dir("missing").join("policy.toml");
        assert!(!path.exists());

        let policy = load_policy_with(Some(path.clone()), |_| None).unwrap();
        assert_eq!(policy, DiscountPolicy::default());

        let policy = load_policy_with(Some(path), |key| {
            (key == ALLOW_STACKING_ENV).then(|| "false".to_string())
        })
        .unwrap();
        assert!(!policy.stacking.allow_stacking);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("maison-policy-test-{}", std::process::id()));
        let path = dir.join("policy.toml");

        let mut policy = DiscountPolicy::default();
        policy.stacking.max_stacked_discounts = 2;
        let written = save_policy(&policy, Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_policy(&contents).unwrap(), policy);

        std::fs::remove_dir_all(&dir).ok();
    }
}
