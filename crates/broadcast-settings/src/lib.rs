//! # broadcast-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BroadcastSettings::default()`]
//! 2. **Settings file**: `~/.broadcast/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `BROADCAST_*` and `PORT` overrides (highest priority)
//!
//! The loaded value is validated before it is returned.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
