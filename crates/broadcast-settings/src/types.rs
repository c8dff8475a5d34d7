//! Settings types.
//!
//! Every struct uses `#[serde(default)]` so a settings file only needs the
//! keys it overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadcastSettings {
    /// HTTP boundary settings.
    pub server: ServerSettings,
    /// Campaign dispatch policy.
    pub dispatch: DispatchSettings,
    /// Session store janitor.
    pub janitor: JanitorSettings,
    /// Messaging gateway connection.
    pub transport: TransportSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl BroadcastSettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.min_delay_ms > self.dispatch.max_delay_ms {
            return Err(SettingsError::InvalidValue(format!(
                "dispatch.minDelayMs ({}) exceeds dispatch.maxDelayMs ({})",
                self.dispatch.min_delay_ms, self.dispatch.max_delay_ms
            )));
        }
        if self.dispatch.country_code.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "dispatch.countryCode must not be empty".into(),
            ));
        }
        if self.janitor.interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "janitor.intervalSecs must be positive".into(),
            ));
        }
        if self.server.upload_stem.is_empty() || self.server.upload_stem.contains(['/', '\\']) {
            return Err(SettingsError::InvalidValue(format!(
                "server.uploadStem must be a bare file name, got {:?}",
                self.server.upload_stem
            )));
        }
        Ok(())
    }
}

/// HTTP boundary settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Directory uploaded attachments are written to.
    pub upload_dir: PathBuf,
    /// File stem every upload is stored under (extension comes from the upload).
    pub upload_stem: String,
    /// Pairing QR image written by the messaging gateway.
    pub qr_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
            max_body_bytes: 16 * 1024 * 1024,
            upload_dir: PathBuf::from("uploads"),
            upload_stem: "upload".to_string(),
            qr_path: PathBuf::from("bot.qr.png"),
        }
    }
}

/// Campaign dispatch policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchSettings {
    /// Prefix prepended to numbers that do not already start with it.
    pub country_code: String,
    /// Appended to a normalized number to form the transport address.
    pub address_suffix: String,
    /// Lower bound of the per-recipient delay window, inclusive.
    pub min_delay_ms: u64,
    /// Upper bound of the per-recipient delay window, inclusive.
    pub max_delay_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            country_code: "57".to_string(),
            address_suffix: "@s.whatsapp.net".to_string(),
            min_delay_ms: 3000,
            max_delay_ms: 5000,
        }
    }
}

/// Session store janitor settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JanitorSettings {
    /// Whether the periodic clean runs at all.
    pub enabled: bool,
    /// Directory holding session artifacts.
    pub session_dir: PathBuf,
    /// Extension (with leading dot) identifying session artifacts.
    pub extension: String,
    /// File names that are never evaluated or deleted.
    pub protected: Vec<String>,
    /// Seconds between passes.
    pub interval_secs: u64,
    /// Run a pass immediately at startup instead of after the first interval.
    pub run_on_start: bool,
}

impl JanitorSettings {
    /// Interval between passes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for JanitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            session_dir: PathBuf::from("bot_sessions"),
            extension: ".json".to_string(),
            protected: vec!["baileys_store.json".to_string(), "creds.json".to_string()],
            interval_secs: 86_400,
            run_on_start: false,
        }
    }
}

/// Messaging gateway connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    /// Base URL of the messaging gateway.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3008".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
