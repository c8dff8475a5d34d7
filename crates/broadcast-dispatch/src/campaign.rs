//! A validated send campaign.

use broadcast_core::MediaDescriptor;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::DispatchError;

/// One "send to many" request.
///
/// Owns its cancellation token, so cancelling one campaign can never affect
/// another. The id exists only for log correlation.
#[derive(Debug)]
pub struct Campaign {
    id: Uuid,
    message: String,
    media: Option<MediaDescriptor>,
    recipients: Vec<String>,
    cancel: CancellationToken,
}

impl Campaign {
    /// Validate and build a campaign.
    ///
    /// The message must contain non-whitespace text and the recipient list
    /// must be non-empty. Individual recipients are not inspected.
    pub fn new(
        message: impl Into<String>,
        media: Option<MediaDescriptor>,
        recipients: Vec<String>,
    ) -> Result<Self, DispatchError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DispatchError::InvalidInput("message is empty".into()));
        }
        if recipients.is_empty() {
            return Err(DispatchError::InvalidInput("no recipients".into()));
        }
        Ok(Self {
            id: Uuid::now_v7(),
            message,
            media,
            recipients,
            cancel: CancellationToken::new(),
        })
    }

    /// Log correlation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attached media, if any.
    pub fn media(&self) -> Option<&MediaDescriptor> {
        self.media.as_ref()
    }

    /// Raw recipient identifiers in input order.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// This campaign's cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Uuid, String, Option<MediaDescriptor>, Vec<String>, CancellationToken) {
        (self.id, self.message, self.media, self.recipients, self.cancel)
    }
}
