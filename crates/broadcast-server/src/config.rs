//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// CORS origins; empty allows any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Where uploaded attachments are written.
    pub upload_dir: PathBuf,
    /// File stem every upload is stored under.
    pub upload_stem: String,
    /// Pairing QR image served by `GET /qr`.
    pub qr_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origins: Vec::new(),
            max_body_bytes: 16 * 1024 * 1024, // 16 MB
            upload_dir: PathBuf::from("uploads"),
            upload_stem: "upload".into(),
            qr_path: PathBuf::from("bot.qr.png"),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
