//! Campaign payload and per-recipient outcome types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Media
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of media attached to a campaign.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A still image.
    #[default]
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
        }
    }
}

/// Media attached to a campaign and sent identically to every recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Where the content lives on disk.
    pub path: PathBuf,
    /// MIME type of the content.
    #[serde(rename = "mimetype")]
    pub mime_type: String,
}

impl MediaDescriptor {
    /// Describe an image stored at `path`.
    pub fn image(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal state of a single recipient's send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Text message accepted by the transport.
    Success,
    /// Media accepted by the transport.
    FileSent,
    /// Campaign was cancelled before this recipient's send started.
    Cancelled,
    /// Transport rejected the send.
    Error,
}

impl OutcomeStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::FileSent => "file_sent",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one recipient within a campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    /// Normalized recipient number (country code included, no address suffix).
    pub number: String,
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Transport failure message, present only for [`OutcomeStatus::Error`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientOutcome {
    /// Text send succeeded.
    pub fn success(number: impl Into<String>) -> Self {
        Self::with_status(number, OutcomeStatus::Success)
    }

    /// Media send succeeded.
    pub fn file_sent(number: impl Into<String>) -> Self {
        Self::with_status(number, OutcomeStatus::FileSent)
    }

    /// Send skipped because the campaign was cancelled.
    pub fn cancelled(number: impl Into<String>) -> Self {
        Self::with_status(number, OutcomeStatus::Cancelled)
    }

    /// Send failed with the given transport message.
    pub fn error(number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            status: OutcomeStatus::Error,
            error: Some(message.into()),
        }
    }

    fn with_status(number: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            number: number.into(),
            status,
            error: None,
        }
    }
}
