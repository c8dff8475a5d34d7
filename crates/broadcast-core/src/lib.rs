//! # broadcast-core
//!
//! Shared vocabulary for the broadcast crates:
//!
//! - **Media**: [`MediaDescriptor`] attached to a campaign
//! - **Outcomes**: [`RecipientOutcome`] and [`OutcomeStatus`] reported per recipient
//! - **Errors**: [`TransportError`] returned by messaging transports
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::TransportError;
pub use types::{MediaDescriptor, MediaKind, OutcomeStatus, RecipientOutcome};
