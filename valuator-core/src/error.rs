//! Error type for valuation computations.

use thiserror::Error;
use valuator_common::ValidationError;

/// Result alias for valuation operations.
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors raised by the calculators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// A user-supplied figure is malformed or outside the model's domain.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Model configuration failed validation.
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),

    /// Reference data cannot be used for calibration.
    #[error("Invalid reference data: {0}")]
    InvalidReference(String),
}

impl ValuationError {
    pub(crate) fn input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the error should be shown to the user as a validation message.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

impl From<ValidationError> for ValuationError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Reject NaN and infinite figures.
pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValuationError::input(
            field,
            format!("must be a finite number, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValuationError::input("revenue", "must not be zero");
        assert_eq!(err.to_string(), "Invalid revenue: must not be zero");
        assert!(err.is_invalid_input());
        assert!(!ValuationError::InvalidConfig("x".into()).is_invalid_input());
    }

    #[test]
    fn test_validation_error_becomes_config_error() {
        let err: ValuationError = ValidationError::invalid("model.weights", "empty").into();
        assert!(matches!(err, ValuationError::InvalidConfig(ref msg) if msg.contains("model.weights")));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("ebit", -10.0).is_ok());
        assert!(ensure_finite("ebit", f64::NAN).is_err());
        assert!(ensure_finite("ebit", f64::INFINITY).is_err());
    }
}
