//! # broadcast-transport
//!
//! The messaging provider is an external collaborator. This crate defines the
//! [`Transport`] seam the dispatcher sends through, plus two implementations:
//!
//! - [`HttpTransport`]: JSON client for a messaging gateway sidecar
//! - [`RecordingTransport`]: in-memory fake with scripted failures

#![deny(unsafe_code)]

pub mod http;
pub mod recording;
pub mod traits;

pub use http::HttpTransport;
pub use recording::{RecordingTransport, SentMessage};
pub use traits::Transport;
