//! Dispatch error type.

use thiserror::Error;

/// Invalid message or empty recipient list.
pub const INVALID_INPUT: &str = "INVALID_INPUT";
/// Another campaign is still active.
pub const BUSY: &str = "BUSY";
/// Orchestration itself failed.
pub const DISPATCH_FAILED: &str = "DISPATCH_FAILED";

/// Campaign-level failure. Per-recipient transport failures never surface
/// here; they are captured in that recipient's outcome.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rejected before any work was started.
    #[error("invalid campaign input: {0}")]
    InvalidInput(String),

    /// A campaign is already sending.
    #[error("a campaign is already in progress")]
    Busy,

    /// The fan-out could not be completed.
    #[error("dispatch failed: {0}")]
    Systemic(String),
}

impl DispatchError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => INVALID_INPUT,
            Self::Busy => BUSY,
            Self::Systemic(_) => DISPATCH_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(DispatchError::InvalidInput("x".into()).code(), INVALID_INPUT);
        assert_eq!(DispatchError::Busy.code(), BUSY);
        assert_eq!(DispatchError::Systemic("x".into()).code(), DISPATCH_FAILED);
    }

    #[test]
    fn display() {
        let err = DispatchError::InvalidInput("message is empty".into());
        assert_eq!(err.to_string(), "invalid campaign input: message is empty");
    }
}
