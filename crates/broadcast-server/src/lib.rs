//! # broadcast-server
//!
//! Axum HTTP boundary for the broadcast service.
//!
//! - `POST /send-message`: start a campaign (multipart with optional `file`, or JSON)
//! - `POST /cancel-send`: cancel the running campaign
//! - `GET /qr`: pairing QR image written by the messaging gateway
//! - `GET /health`, `GET /metrics`: liveness and Prometheus text
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod form;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod upload;

pub use config::ServerConfig;
pub use errors::ApiError;
pub use server::BroadcastServer;
pub use shutdown::ShutdownCoordinator;
