//! Error taxonomy shared by every calculator and transport

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Input outside the calculator's domain. Reported as-is, never retried.
    #[error("{0}")]
    Validation(String),

    #[error("Unable to compute a rate: no convergence after {iterations} iterations")]
    NoConvergence { iterations: u32 },

    /// The backend could not be reached or timed out.
    #[error("Backend unavailable: {0}")]
    Transport(String),

    /// The backend answered, but not with anything we understand.
    #[error("Unexpected backend response: {0}")]
    Backend(String),
}

impl CalcError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CalcError::Validation(msg.into())
    }

    /// Whether a local evaluation may stand in for the failed call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::Transport(_) | CalcError::Backend(_))
    }
}

impl From<reqwest::Error> for CalcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CalcError::Backend(e.to_string())
        } else {
            CalcError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::Validation(format!("Malformed input: {e}"))
    }
}

/// Rejects NaN and infinities with a field-specific message.
pub fn ensure_finite(field: &str, value: f64) -> Result<(), CalcError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::Validation(format!("{field} must be a finite number")))
    }
}

/// Checks `min <= value <= max`, the usual shape of a form-field bound.
pub fn ensure_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if value < min || value > max {
        return Err(CalcError::Validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

pub fn ensure_positive(field: &str, value: f64) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

pub fn ensure_non_negative(field: &str, value: f64) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(CalcError::Validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
