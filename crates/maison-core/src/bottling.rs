//! # Bottling Math
//!
//! Cost and margin arithmetic for decanting bulk perfume into retail
//! bottles. Inventory rows are updated elsewhere; this module only answers
//! "what would this batch consume and cost".
//!
//! ## Workflow
//! ```text
//! Bulk stock: 1000 ml @ 120/ml
//!      │
//!      ▼
//! plan_bottling(10 × 50 ml, container 1500, retail 12000)
//!      │
//!      ├── needs 500 ml → 500 ml left
//!      ├── unit cost  = 50 × 120 + 1500 = 7500
//!      └── margin     = (12000 - 7500) / 12000 = 37.50%
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Percent;
use crate::validation::validate_positive;

/// Bulk perfume available for bottling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BulkStock {
    pub volume_ml: u32,
    pub cost_per_ml: Money,
}

/// A proposed batch of retail bottles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BottlingRequest {
    pub bottle_size_ml: u32,
    pub bottle_count: u32,
    /// Empty bottle, atomizer and label, per bottle.
    pub container_cost: Money,
    /// Shelf price of one filled bottle.
    pub retail_price: Money,
}

/// What a batch consumes and earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BottlingPlan {
    pub required_ml: u64,
    pub remaining_ml: u64,
    pub unit_cost: Money,
    pub batch_cost: Money,
    /// Share of the retail price kept after unit cost; zero on a loss.
    pub margin: Percent,
    pub unit_profit: Money,
}

impl BottlingPlan {
    pub fn is_loss(&self) -> bool {
        self.unit_profit.is_negative()
    }
}

/// Plans a bottling batch against the available bulk stock.
///
/// ## Errors
/// - `Validation` when bottle size or count is zero
/// - `InsufficientStock` when the batch needs more than `stock.volume_ml`
/// - `AmountOverflow` when a cost does not fit in `Money`
pub fn plan_bottling(stock: &BulkStock, request: &BottlingRequest) -> CoreResult<BottlingPlan> {
    validate_positive("bottle size", request.bottle_size_ml as i64)?;
    validate_positive("bottle count", request.bottle_count as i64)?;

    let required_ml = request.bottle_size_ml as u64 * request.bottle_count as u64;
    let available_ml = stock.volume_ml as u64;
    if required_ml > available_ml {
        return Err(CoreError::InsufficientStock {
            required_ml,
            available_ml,
        });
    }

    let unit_cost = stock
        .cost_per_ml
        .checked_mul(request.bottle_size_ml as i64)
        .and_then(|fill| fill.checked_add(request.container_cost))
        .ok_or(CoreError::AmountOverflow("unit cost"))?;
    let batch_cost = unit_cost
        .checked_mul(request.bottle_count as i64)
        .ok_or(CoreError::AmountOverflow("batch cost"))?;
    let unit_profit = request
        .retail_price
        .checked_sub(unit_cost)
        .ok_or(CoreError::AmountOverflow("unit profit"))?;
    let margin = Percent::ratio(unit_profit, request.retail_price);

    debug!(
        required_ml,
        unit_cost = unit_cost.minor(),
        margin_bps = margin.bps(),
        "Bottling batch planned"
    );

    Ok(BottlingPlan {
        required_ml,
        remaining_ml: available_ml - required_ml,
        unit_cost,
        batch_cost,
        margin,
        unit_profit,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> BulkStock {
        BulkStock {
            volume_ml: 1000,
            cost_per_ml: Money::from_minor(120),
        }
    }

    fn request(count: u32, price: i64) -> BottlingRequest {
        BottlingRequest {
            bottle_size_ml: 50,
            bottle_count: count,
            container_cost: Money::from_minor(1500),
            retail_price: Money::from_minor(price),
        }
    }

    #[test]
    fn test_plan_costs_and_margin() {
        let plan = plan_bottling(&stock(), &request(10, 12000)).unwrap();

        assert_eq!(plan.required_ml, 500);
        assert_eq!(plan.remaining_ml, 500);
        assert_eq!(plan.unit_cost, Money::from_minor(7500));
        assert_eq!(plan.batch_cost, Money::from_minor(75000));
        assert_eq!(plan.margin, Percent::from_bps(3750));
        assert!(!plan.is_loss());
    }

    #[test]
    fn test_uses_entire_stock() {
        let plan = plan_bottling(&stock(), &request(20, 12000)).unwrap();
        assert_eq!(plan.remaining_ml, 0);
    }

    #[test]
    fn test_insufficient_stock() {
        let err = plan_bottling(&stock(), &request(21, 12000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { required_ml: 1050, available_ml: 1000 }
        ));
    }

    #[test]
    fn test_loss_has_zero_margin() {
        let plan = plan_bottling(&stock(), &request(1, 5000)).unwrap();
        assert!(plan.is_loss());
        assert_eq!(plan.margin, Percent::zero());
        assert_eq!(plan.unit_profit, Money::from_minor(-2500));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut req = request(1, 5000);
        req.bottle_size_ml = 0;
        assert!(matches!(plan_bottling(&stock(), &req), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_cost_overflow_is_an_error() {
        let pricey = BulkStock {
            volume_ml: 1000,
            cost_per_ml: Money::from_minor(i64::MAX / 10),
        };
        let err = plan_bottling(&pricey, &request(1, 5000)).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow("unit cost")));

        let near_max = BulkStock {
            volume_ml: 1000,
            cost_per_ml: Money::from_minor(i64::MAX / 100),
        };
        let err = plan_bottling(&near_max, &request(10, 5000)).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow("batch cost")));
    }
}
