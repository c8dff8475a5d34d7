//! The [`Transport`] trait.

use async_trait::async_trait;
use broadcast_core::{MediaDescriptor, TransportError};

/// Opaque send primitive of a messaging provider.
///
/// `address` is the provider-level destination (normalized number plus the
/// provider's address suffix). Latency and failure modes are provider-defined;
/// callers must not assume anything beyond success or failure per call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message.
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError>;

    /// Send a media attachment.
    async fn send_media(&self, address: &str, media: &MediaDescriptor)
    -> Result<(), TransportError>;
}
