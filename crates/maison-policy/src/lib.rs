//! # maison-policy: Discount Policy Loading
//!
//! Turns `policy.toml` plus `MAISON_*` environment overrides into the
//! immutable [`DiscountPolicy`] that `maison-core` evaluates against.
//!
//! ## Usage
//! ```rust,no_run
//! use maison_policy::load_policy;
//!
//! # fn main() -> Result<(), maison_policy::PolicyError> {
//! let policy = load_policy(None)?;
//! assert!(policy.stacking.max_stacked_discounts >= 1);
//! # Ok(())
//! # }
//! ```
//!
//! [`DiscountPolicy`]: maison_core::DiscountPolicy

pub mod config;
pub mod error;

pub use config::{
    apply_overrides, default_policy_path, load_policy, load_policy_or_default, load_policy_with,
    parse_policy, save_policy, PolicyFile,
};
pub use error::{PolicyError, PolicyResult};
