use crate::timeseries::{FloatValue, Time};
use std::fmt;
use thiserror::Error;

/// The last point of a trajectory known to be finite before a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePoint {
    pub time: Time,
    pub value: FloatValue,
}

impl fmt::Display for StatePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}, T={}", self.time, self.value)
    }
}

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EBMError {
    /// Inputs that are rejected before any integration is attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Failures detected while the solver is stepping
    #[error("Numerical failure: {reason}{}", describe_last_valid(.last_valid))]
    NumericalFailure {
        reason: String,
        last_valid: Option<StatePoint>,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn describe_last_valid(last_valid: &Option<StatePoint>) -> String {
    match last_valid {
        Some(point) => format!(" (last valid state: {point})"),
        None => String::new(),
    }
}

impl EBMError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EBMError::InvalidInput(message.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EBMError::InvalidInput(_))
    }

    pub fn is_numerical_failure(&self) -> bool {
        matches!(self, EBMError::NumericalFailure { .. })
    }
}

/// Convenience type for `Result<T, EBMError>`.
pub type EBMResult<T> = Result<T, EBMError>;
