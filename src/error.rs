//! Error types for the moment converter.

use thiserror::Error;

/// Converter error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A mean, standard deviation or other input outside its domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An arithmetic step produced an infinite or undefined value.
    #[error("Computation failure: {0}")]
    ComputationFailure(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Fail with `ComputationFailure` unless `value` is finite.
pub(crate) fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::ComputationFailure(format!("{} is not finite ({})", name, value)))
    }
}

/// Fail with `InvalidInput` unless `value` is finite and strictly positive.
pub(crate) fn positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidInput(format!("{} must be finite and > 0, got {}", name, value)))
    }
}
