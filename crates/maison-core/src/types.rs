//! # Domain Types
//!
//! Discount records exchanged with the admin and checkout collaborators.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌────────────────┐   │
//! │  │ DiscountConfig  │   │    DiscountKind      │   │ DiscountScope  │   │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ────────────  │   │
//! │  │  id (UUID)      │──►│  Percentage(bps)     │   │  All           │   │
//! │  │  kind           │   │  FixedAmount(money)  │   │  Scoped("..")  │   │
//! │  │  category       │   │  BottleReturn(count) │   └────────────────┘   │
//! │  │  start/end date │   └──────────────────────┘                        │
//! │  │  scope          │                                                    │
//! │  └─────────────────┘   ┌──────────────────────┐   ┌────────────────┐   │
//! │                        │      Percent         │   │ CustomerTier   │   │
//! │                        │  1500 bps = 15%      │   │ bronze .. vip  │   │
//! │                        └──────────────────────┘   └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Category used when a discount does not name one, and the fallback
/// entry of the temporal rules table.
pub const REGULAR_CATEGORY: &str = "regular";

/// Scope label that matches every other scope.
pub const SCOPE_ALL: &str = "all";

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points.
///
/// 1 basis point = 0.01%, so `Percent::from_points(15)` is stored as 1500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100% in basis points.
    pub const FULL: Percent = Percent(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Whole percentage points: `from_points(15)` = 15%.
    #[inline]
    pub const fn from_points(points: u32) -> Self {
        Percent(points * 100)
    }

    /// Creates a percentage from a fractional value (`12.5` = 12.5%).
    /// Negative input saturates at zero.
    pub fn from_percentage(pct: f64) -> Self {
        Percent((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// The share `part / whole` in basis points, rounded half-up.
    /// Zero when `whole` is not positive.
    pub fn ratio(part: Money, whole: Money) -> Percent {
        if !whole.is_positive() || !part.is_positive() {
            return Percent::zero();
        }
        let whole = whole.minor() as i128;
        let bps = (part.minor() as i128 * 10_000 + whole / 2) / whole;
        Percent(bps.min(u32::MAX as i128) as u32)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// The closed set of discount types.
///
/// Declaration order is the stacking priority: percentage discounts are
/// applied first, bottle returns last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    BottleReturn,
}

impl DiscountType {
    pub const ALL: [DiscountType; 3] = [
        DiscountType::Percentage,
        DiscountType::FixedAmount,
        DiscountType::BottleReturn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::FixedAmount => "fixed_amount",
            DiscountType::BottleReturn => "bottle_return",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed_amount" | "fixed" => Ok(DiscountType::FixedAmount),
            "bottle_return" => Ok(DiscountType::BottleReturn),
            _ => Err(ValidationError::NotAllowed {
                field: "discount type".to_string(),
                allowed: DiscountType::ALL.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// What a discount takes off an order, tagged by its type.
///
/// ## JSON shape
/// ```json
/// { "type": "percentage", "percent": 1500 }
/// { "type": "fixed_amount", "amount": 2000 }
/// { "type": "bottle_return", "bottles": 3, "credit": 3000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountKind {
    /// Share of the remaining order amount, in basis points.
    Percentage { percent: Percent },

    /// Flat amount in minor currency units.
    FixedAmount { amount: Money },

    /// Credit for returned bottles.
    ///
    /// `credit` is advisory: validation replaces it with the amount of the
    /// tier matching `bottles`, and calculation always looks the tier up.
    BottleReturn {
        bottles: u32,
        #[serde(default)]
        credit: Money,
    },
}

impl DiscountKind {
    pub fn discount_type(&self) -> DiscountType {
        match self {
            DiscountKind::Percentage { .. } => DiscountType::Percentage,
            DiscountKind::FixedAmount { .. } => DiscountType::FixedAmount,
            DiscountKind::BottleReturn { .. } => DiscountType::BottleReturn,
        }
    }
}

// =============================================================================
// Discount Scope
// =============================================================================

/// Where a discount applies: everywhere, or a named scope such as
/// `"category:perfume"` or `"product:42"`.
///
/// Serialized as a plain string; `"all"` is the universal scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountScope {
    #[default]
    All,
    Scoped(String),
}

impl DiscountScope {
    /// True when either side is universal or both name the same scope.
    pub fn overlaps(&self, other: &DiscountScope) -> bool {
        match (self, other) {
            (DiscountScope::All, _) | (_, DiscountScope::All) => true,
            (DiscountScope::Scoped(a), DiscountScope::Scoped(b)) => a == b,
        }
    }
}

impl From<String> for DiscountScope {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(SCOPE_ALL) {
            DiscountScope::All
        } else {
            DiscountScope::Scoped(trimmed.to_string())
        }
    }
}

impl From<&str> for DiscountScope {
    fn from(value: &str) -> Self {
        DiscountScope::from(value.to_string())
    }
}

impl From<DiscountScope> for String {
    fn from(scope: DiscountScope) -> Self {
        match scope {
            DiscountScope::All => SCOPE_ALL.to_string(),
            DiscountScope::Scoped(s) => s,
        }
    }
}

impl fmt::Display for DiscountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountScope::All => f.write_str(SCOPE_ALL),
            DiscountScope::Scoped(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Discount Config
// =============================================================================

/// A proposed or persisted discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountConfig {
    /// Unique identifier (UUID v4 when generated here).
    #[serde(default)]
    pub id: String,

    pub kind: DiscountKind,

    /// Selects the temporal rule; absent means [`REGULAR_CATEGORY`].
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,

    /// Passed through untouched by validation.
    #[serde(default)]
    #[ts(as = "String")]
    pub scope: DiscountScope,
}

fn default_category() -> String {
    REGULAR_CATEGORY.to_string()
}

impl DiscountConfig {
    /// Creates a store-wide, undated discount in the regular category.
    pub fn new(kind: DiscountKind) -> Self {
        DiscountConfig {
            id: Uuid::new_v4().to_string(),
            kind,
            category: default_category(),
            start_date: None,
            end_date: None,
            scope: DiscountScope::All,
        }
    }

    pub fn percentage(points: u32) -> Self {
        Self::new(DiscountKind::Percentage {
            percent: Percent::from_points(points),
        })
    }

    pub fn fixed_amount(amount: Money) -> Self {
        Self::new(DiscountKind::FixedAmount { amount })
    }

    pub fn bottle_return(bottles: u32) -> Self {
        Self::new(DiscountKind::BottleReturn {
            bottles,
            credit: Money::zero(),
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<DiscountScope>) -> Self {
        self.scope = scope.into();
        self
    }

    #[inline]
    pub fn discount_type(&self) -> DiscountType {
        self.kind.discount_type()
    }

    /// Category used for temporal lookups; blank falls back to regular.
    pub fn category_or_regular(&self) -> &str {
        let category = self.category.trim();
        if category.is_empty() {
            REGULAR_CATEGORY
        } else {
            category
        }
    }

    /// Whether `date` falls inside the validity window. Missing bounds are
    /// open-ended.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let started = self.start_date.map_or(true, |start| start <= date);
        let not_ended = self.end_date.map_or(true, |end| date <= end);
        started && not_ended
    }
}

// =============================================================================
// Stacked Discount Request
// =============================================================================

/// An order amount and the discounts believed applicable to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StackedDiscountRequest {
    pub base_amount: Money,
    #[serde(default)]
    pub candidates: Vec<DiscountConfig>,
}

// =============================================================================
// Customer Tier
// =============================================================================

/// Loyalty tier of the customer placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CustomerTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Vip,
}

impl CustomerTier {
    pub const ALL: [CustomerTier; 5] = [
        CustomerTier::Bronze,
        CustomerTier::Silver,
        CustomerTier::Gold,
        CustomerTier::Platinum,
        CustomerTier::Vip,
    ];
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerTier::Bronze => write!(f, "bronze"),
            CustomerTier::Silver => write!(f, "silver"),
            CustomerTier::Gold => write!(f, "gold"),
            CustomerTier::Platinum => write!(f, "platinum"),
            CustomerTier::Vip => write!(f, "vip"),
        }
    }
}

impl FromStr for CustomerTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bronze" => Ok(CustomerTier::Bronze),
            "silver" => Ok(CustomerTier::Silver),
            "gold" => Ok(CustomerTier::Gold),
            "platinum" => Ok(CustomerTier::Platinum),
            "vip" => Ok(CustomerTier::Vip),
            _ => Err(ValidationError::NotAllowed {
                field: "customer tier".to_string(),
                allowed: CustomerTier::ALL.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
