//! Error types for heoslink
//!
//! Every failure is one of four kinds. The dispatch layer decides whether to
//! retry purely from [`HeosError::kind`].

use thiserror::Error;

use crate::protocol::ErrorId;

/// Result type alias using HeosError
pub type Result<T> = std::result::Result<T, HeosError>;

/// Unified error type for heoslink operations
#[derive(Debug, Error)]
pub enum HeosError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    /// Caller input missing or malformed, detected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    /// The device answered with `result=fail`
    #[error("Command failed (eid {eid}): {text}")]
    CommandFailure { eid: ErrorId, text: String },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Everything Else
    // -------------------------------------------------------------------------
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Discriminant of [`HeosError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    CommandFailure,
    Transport,
    Unexpected,
}

impl ErrorKind {
    /// True when the caller has to fix its request rather than retry later
    pub fn is_client_fault(self) -> bool {
        matches!(self, ErrorKind::Validation)
    }

    /// Only transport failures are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

impl HeosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeosError::Validation(_) => ErrorKind::Validation,
            HeosError::CommandFailure { .. } => ErrorKind::CommandFailure,
            HeosError::Transport(_) => ErrorKind::Transport,
            HeosError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        HeosError::Validation(msg.into())
    }

    /// Transport error that did not originate from the OS
    pub(crate) fn transport(kind: std::io::ErrorKind, msg: impl Into<String>) -> Self {
        HeosError::Transport(std::io::Error::new(kind, msg.into()))
    }
}
