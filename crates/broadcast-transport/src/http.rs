//! HTTP client for a messaging gateway sidecar.
//!
//! The gateway owns the provider connection (pairing, encryption, retries) and
//! exposes two JSON endpoints:
//!
//! - `POST {base}/send-text`: `{"to": ..., "text": ...}`
//! - `POST {base}/send-media`: `{"to": ..., "media": {"type", "path", "mimetype"}}`
//!
//! Any 2xx is success. Otherwise the gateway's `message` (or `error`) field is
//! surfaced as [`TransportError::Rejected`].

use std::time::Duration;

use async_trait::async_trait;
use broadcast_core::{MediaDescriptor, TransportError};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::traits::Transport;

#[derive(Serialize)]
struct TextRequest<'a> {
    to: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct MediaRequest<'a> {
    to: &'a str,
    media: &'a MediaDescriptor,
}

/// [`Transport`] backed by a messaging gateway reachable over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a client for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    /// Gateway base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), TransportError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            debug!(%url, %status, "gateway accepted send");
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        Err(TransportError::rejected(rejection_message(status, &text)))
    }
}

/// Pull a human-readable reason out of a gateway error body.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!(
            "gateway returned {}",
            status.canonical_reason().unwrap_or(status.as_str())
        )
    } else {
        body.to_owned()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.post("/send-text", &TextRequest { to: address, text })
            .await
    }

    async fn send_media(
        &self,
        address: &str,
        media: &MediaDescriptor,
    ) -> Result<(), TransportError> {
        self.post("/send-media", &MediaRequest { to: address, media })
            .await
    }
}
