//! Transport error type.
//!
//! The transport is an opaque collaborator: its failures are captured into a
//! recipient's outcome verbatim, so every variant displays as the bare message.

use thiserror::Error;

/// Failure reported by a messaging transport for a single send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The provider received the request and refused it.
    #[error("{message}")]
    Rejected {
        /// Provider-supplied reason.
        message: String,
    },

    /// The request never produced a provider response (connect, timeout, decode).
    #[error("{0}")]
    Http(String),

    /// The transport is not connected or not paired.
    #[error("{0}")]
    Unavailable(String),
}

impl TransportError {
    /// Create a [`TransportError::Rejected`].
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
