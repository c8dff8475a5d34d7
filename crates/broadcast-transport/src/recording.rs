//! In-memory transport that records every send.
//!
//! Used by tests across the workspace and by the daemon's `--dry-run` mode.
//! Failures are scripted per address; an optional latency simulates the
//! provider round-trip.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use broadcast_core::{MediaDescriptor, TransportError};
use parking_lot::Mutex;
use tracing::info;

use crate::traits::Transport;

/// A send observed by [`RecordingTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentMessage {
    /// A text send.
    Text {
        /// Destination address.
        to: String,
        /// Message body.
        text: String,
    },
    /// A media send.
    Media {
        /// Destination address.
        to: String,
        /// Attached media.
        media: MediaDescriptor,
    },
}

impl SentMessage {
    /// Destination address of the send.
    pub fn to(&self) -> &str {
        match self {
            Self::Text { to, .. } | Self::Media { to, .. } => to,
        }
    }
}

/// [`Transport`] that keeps sends in memory instead of contacting a provider.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    failures: Mutex<HashMap<String, String>>,
    latency: Option<Duration>,
}

impl RecordingTransport {
    /// Create a transport that accepts every send immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every send by `latency` before it is recorded.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every send to `address` fail with `message`.
    pub fn fail_for(&self, address: impl Into<String>, message: impl Into<String>) {
        let _ = self.failures.lock().insert(address.into(), message.into());
    }

    /// Snapshot of accepted sends, in completion order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Number of accepted sends.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    async fn deliver(&self, message: SentMessage) -> Result<(), TransportError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reason) = self.failures.lock().get(message.to()).cloned() {
            return Err(TransportError::rejected(reason));
        }
        info!(to = message.to(), "recorded send");
        self.sent.lock().push(message);
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.deliver(SentMessage::Text {
            to: address.to_owned(),
            text: text.to_owned(),
        })
        .await
    }

    async fn send_media(
        &self,
        address: &str,
        media: &MediaDescriptor,
    ) -> Result<(), TransportError> {
        self.deliver(SentMessage::Media {
            to: address.to_owned(),
            media: media.clone(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_text_sends() {
        let t = RecordingTransport::new();
        t.send_text("a", "hi").await.unwrap();
        assert_eq!(
            t.sent(),
            vec![SentMessage::Text {
                to: "a".into(),
                text: "hi".into()
            }]
        );
    }

    #[tokio::test]
    async fn records_media_sends() {
        let t = RecordingTransport::new();
        let media = MediaDescriptor::image("u/upload.jpg", "image/jpeg");
        t.send_media("b", &media).await.unwrap();
        assert_eq!(t.sent_count(), 1);
        assert_eq!(t.sent()[0].to(), "b");
    }

    #[tokio::test]
    async fn scripted_failure_not_recorded() {
        let t = RecordingTransport::new();
        t.fail_for("bad", "blocked");
        let err = t.send_text("bad", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "blocked");
        assert_eq!(t.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_applied() {
        let t = RecordingTransport::new().with_latency(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        t.send_text("a", "hi").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
