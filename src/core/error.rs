// This module defines the error taxonomy for vexlift using the thiserror crate. LiftError
// has exactly three variants: Configuration for request or architecture preconditions
// that fail during resolution (before the engine lock is taken), UnsupportedArchitecture
// for dispatch misses in the lifter registry, and Lifting for engine-reported failures and
// zero-size blocks. Each variant carries the diagnostic text handed back to the caller.
// LiftResult<T> is the convenience alias used across the crate.

//! Error types for vexlift.

use thiserror::Error;

/// Fallback message when the engine fails without writing to its log.
pub const UNKNOWN_ENGINE_ERROR: &str = "unknown error";

/// Message for a block the engine accepted but made no progress on.
pub const NO_INSTRUCTIONS_DECODED: &str = "could not decode any instructions";

/// Main error type for lift operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiftError {
    /// A precondition on the request or the architecture does not hold.
    /// Raised before the engine lock is taken.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// No lifter is registered under the requested architecture name.
    #[error("unsupported architecture: {name}")]
    UnsupportedArchitecture { name: String },

    /// The engine reported failure, or succeeded without decoding anything.
    #[error("{message}")]
    Lifting { message: String },
}

impl LiftError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        LiftError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn unsupported(name: impl Into<String>) -> Self {
        LiftError::UnsupportedArchitecture { name: name.into() }
    }

    pub fn lifting(message: impl Into<String>) -> Self {
        LiftError::Lifting {
            message: message.into(),
        }
    }

    /// Diagnostic text carried by the error, without the variant prefix.
    pub fn diagnostic(&self) -> &str {
        match self {
            LiftError::Configuration { reason } => reason,
            LiftError::UnsupportedArchitecture { name } => name,
            LiftError::Lifting { message } => message,
        }
    }
}

/// Result type alias for lift operations.
pub type LiftResult<T> = Result<T, LiftError>;
