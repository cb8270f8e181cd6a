//! # Policy Error Types

use maison_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for policy loading.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Everything that can go wrong between `policy.toml` and a usable policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Reading or writing the policy file failed.
    #[error("Policy file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The policy file is not valid TOML or has the wrong shape.
    #[error("Failed to parse policy file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The policy could not be written as TOML.
    #[error("Failed to serialize policy: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A JSON request could not be read.
    #[error("Invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override has an unparseable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// A tier or discount type name in the file is unknown.
    #[error("Unknown name in policy file: {0}")]
    UnknownName(#[from] ValidationError),

    /// The merged policy is internally inconsistent.
    #[error(transparent)]
    InvalidPolicy(#[from] CoreError),

    /// No explicit path and no platform config directory.
    #[error("No policy file path available")]
    NoConfigPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PolicyError::InvalidValue {
            key: "MAISON_MAX_STACKED_DISCOUNTS".into(),
            value: "many".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for MAISON_MAX_STACKED_DISCOUNTS: 'many'"
        );

        let err: PolicyError = CoreError::InvalidPolicy("no regular entry".into()).into();
        assert_eq!(err.to_string(), "Invalid discount policy: no regular entry");
    }
}
