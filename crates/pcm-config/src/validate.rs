//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::miner::{MinerConfig, MIN_CYCLE_LENGTH};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 21,
            ValidationError::VersionMismatch { .. } => 22,
        }
    }
}

/// Validate a miner configuration semantically.
pub fn validate_miner_config(config: &MinerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.max_length < MIN_CYCLE_LENGTH {
        return Err(ValidationError::InvalidValue {
            field: "max_length".to_string(),
            message: format!("Must be >= {}, got {}", MIN_CYCLE_LENGTH, config.max_length),
        });
    }

    if config.min_length < MIN_CYCLE_LENGTH || config.min_length > config.max_length {
        return Err(ValidationError::InvalidValue {
            field: "min_length".to_string(),
            message: format!(
                "Must be in [{}, max_length={}], got {}",
                MIN_CYCLE_LENGTH, config.max_length, config.min_length
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_miner_config(&MinerConfig::default()).is_ok());
    }

    #[test]
    fn test_max_length_too_small() {
        let config = MinerConfig::default().with_max_length(1).with_min_length(1);
        let err = validate_miner_config(&config).unwrap_err();
        match err {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "max_length"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_min_length_above_max() {
        let config = MinerConfig::default().with_max_length(4).with_min_length(5);
        let err = validate_miner_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "min_length"));
        assert_eq!(err.code(), 21);
    }

    #[test]
    fn test_version_mismatch() {
        let config = MinerConfig {
            schema_version: "0.9.0".to_string(),
            ..MinerConfig::default()
        };
        let err = validate_miner_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
    }
}
