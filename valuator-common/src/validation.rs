//! Configuration validation.
//!
//! Each configuration section implements [`Validate`]; sections are checked
//! independently and their errors collected with [`collect`].

use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

/// Fold the outcome of several section checks into a single result.
pub fn collect(results: impl IntoIterator<Item = ValidationResult<()>>) -> ValidationResult<()> {
    let mut errors: Vec<ValidationError> = results.into_iter().filter_map(Result::err).collect();

    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

/// Check that a value is a finite number.
pub fn require_finite(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, format!("must be finite, got {value}")))
    }
}

/// Check that a value lies within `[0, 1]`.
pub fn require_fraction(field: &str, value: f64) -> ValidationResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be between 0 and 1, got {value}"),
        ))
    }
}

/// Largest whole-unit amount a price or payment may take.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Check that a whole-unit amount lies within `[0, MAX_AMOUNT]`.
pub fn require_amount(field: &str, value: i64) -> ValidationResult<()> {
    if (0..=MAX_AMOUNT).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be between 0 and {MAX_AMOUNT}, got {value}"),
        ))
    }
}

/// Check that a value is strictly positive and finite.
pub fn require_positive(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}
