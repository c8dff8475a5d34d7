//! # broadcast-dispatch
//!
//! Turns one send campaign into many independently delayed, independently
//! failable per-recipient sends and collects their outcomes.
//!
//! - [`Dispatcher`]: owns the transport and the single active-campaign slot
//! - [`Campaign`]: validated payload plus its own cancellation token
//! - [`normalize_number`]: country-code prefixing policy
//! - [`DelayWindow`]: randomized per-recipient stagger

#![deny(unsafe_code)]

pub mod campaign;
pub mod delay;
pub mod dispatcher;
pub mod errors;
pub mod normalize;

pub use campaign::Campaign;
pub use delay::DelayWindow;
pub use dispatcher::{DispatchConfig, Dispatcher};
pub use errors::DispatchError;
pub use normalize::normalize_number;
