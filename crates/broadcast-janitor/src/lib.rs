//! # broadcast-janitor
//!
//! The messaging transport persists many session and pre-key files. Only the
//! most recently modified one matters, plus a fixed set of credential files
//! that must never be touched. [`SessionJanitor`] performs one cleaning pass;
//! [`JanitorTask`] runs passes on an interval until stopped.
//!
//! Filesystem errors never escape: they are logged and counted.

#![deny(unsafe_code)]

pub mod janitor;
pub mod task;

pub use janitor::{CleanReport, SessionJanitor, select_latest};
pub use task::JanitorTask;
