//! # maison-core: Discount Rules for a Boutique Back Office
//!
//! Pure business logic with zero I/O: the discount policy tables, the rule
//! engine that validates and stacks discounts, and perfume bottling math.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Maison Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         Admin UI (React)          Checkout (order totals)       │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │ draft discount               │ order + candidates     │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ maison-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │  types   │  │  policy  │  │  engine  │  │   bottling   │  │   │
//! │  │   │ Discount │  │  tables  │  │ validate │  │  cost/margin │  │   │
//! │  │   │ Percent  │  │ defaults │  │  stack   │  │              │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                 ▲                                                       │
//! │  ┌──────────────┴──────────────────────────────────────────────────┐   │
//! │  │        maison-policy: policy.toml + env → DiscountPolicy         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Discount records, percentages, scopes, customer tiers
//! - [`money`] - Integer money in minor currency units
//! - [`policy`] - The immutable policy tables and their defaults
//! - [`engine`] - Validation, stacking and compatibility rules
//! - [`bottling`] - Bulk-to-bottle cost and margin
//! - [`error`] - Domain error types
//! - [`validation`] - Field validators
//!
//! ## Example Usage
//!
//! ```rust
//! use maison_core::engine::calculate_stacked_discount;
//! use maison_core::{DiscountConfig, DiscountPolicy, Money};
//!
//! let policy = DiscountPolicy::default();
//! let candidates = vec![
//!     DiscountConfig::percentage(15),
//!     DiscountConfig::bottle_return(2),
//! ];
//!
//! // 15% of 10000 = 1500, then 2 bottles = 2000 off the remaining 8500
//! let off = calculate_stacked_discount(Money::from_minor(10000), &candidates, &policy);
//! assert_eq!(off.minor(), 3500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bottling;
pub mod engine;
pub mod error;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, DiscountRuleError, RuleErrorKind, ValidationError};
pub use money::Money;
pub use policy::DiscountPolicy;
pub use types::*;
