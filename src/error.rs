//! Error types for the checker.
//!
//! All errors are strongly typed using thiserror, split by the phase in
//! which they can arise: validation at construction time, execution during
//! a sampling session. This enables pattern matching on specific error
//! conditions and keeps failure messages precise.

use thiserror::Error;

/// Validation errors raised while constructing a checker.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("delta {value} is out of range: must be finite and > 0")]
    DeltaOutOfRange {
        value: f64,
    },

    #[error("alpha {value} is out of range (0, 1)")]
    AlphaOutOfRange {
        value: f64,
    },

    #[error("minimum sample size {min_n} exceeds maximum sample size {max_n}")]
    MinExceedsMax {
        min_n: usize,
        max_n: usize,
    },

    #[error("stop rule '{rule}' requires an aggregator with a spread estimate")]
    SpreadRequired {
        rule: String,
    },

    #[error("required field '{field}' is missing")]
    MissingField {
        field: String,
    },
}

/// Execution errors raised while a sampling session runs.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("session setup failed: {message}")]
    Setup {
        message: String,
    },

    #[error("simulation run failed: {message}")]
    RunFailed {
        message: String,
    },

    #[error("worker pool disconnected before the batch completed")]
    Disconnected,

    #[error("{required} samples required for a spread estimate, got {n}")]
    InsufficientSamples {
        n: usize,
        required: usize,
    },

    #[error("aggregator does not estimate sample spread")]
    SpreadUnsupported,

    #[error("session was cancelled")]
    Cancelled,

    #[error("execute() was already invoked on this session")]
    AlreadyStarted,

    #[error("session has not been started")]
    NotStarted,
}

/// Top-level error type for the checker.
#[derive(Debug, Clone, Error)]
pub enum AsmcError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("internal error: {message}")]
    Internal {
        message: String,
    },
}

impl AsmcError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if the session was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Cancelled))
    }
}

/// Result type alias for checker operations.
pub type AsmcResult<T> = Result<T, AsmcError>;
