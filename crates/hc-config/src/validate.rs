//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::search::SearchConfig;
use crate::{CONFIG_SCHEMA_VERSION, MAX_ALPHABET_SIZE};

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

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Validate a search configuration semantically.
pub fn validate_search_config(config: &SearchConfig) -> ValidationResult<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.size == 0 || config.size > MAX_ALPHABET_SIZE {
        return Err(invalid(
            "size",
            format!("Must be in [1, {}], got {}", MAX_ALPHABET_SIZE, config.size),
        ));
    }

    if config.hmm_searches == 0 {
        return Err(invalid("hmm_searches", "Must be at least 1".to_string()));
    }

    if !config.epsilon.is_finite() || config.epsilon < 0.0 {
        return Err(invalid(
            "epsilon",
            format!("Must be finite and non-negative, got {}", config.epsilon),
        ));
    }

    if !(0.0..=1.0).contains(&config.proportion) {
        return Err(invalid(
            "proportion",
            format!("Must be in [0, 1], got {}", config.proportion),
        ));
    }

    if let Some(cap) = config.max_complexity {
        if cap < 2 {
            return Err(invalid(
                "max_complexity",
                format!("Search starts at 2 states, got cap {}", cap),
            ));
        }
    }

    Ok(())
}
