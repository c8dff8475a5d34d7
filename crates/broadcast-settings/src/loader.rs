//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BroadcastSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BroadcastSettings;

/// Resolve the default settings file path (`~/.broadcast/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".broadcast").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BroadcastSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults (plus env overrides). If the
/// file contains invalid JSON or the result fails validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<BroadcastSettings> {
    let mut settings = load_file_layer(path)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
fn load_file_layer(path: &Path) -> Result<BroadcastSettings> {
    let defaults = serde_json::to_value(BroadcastSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides read through `lookup` (the process environment in production).
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
///
/// `BROADCAST_PORT` wins over the bare `PORT` when both are set.
pub fn apply_overrides(settings: &mut BroadcastSettings, lookup: impl Fn(&str) -> Option<String>) {
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u16("BROADCAST_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("BROADCAST_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.string("BROADCAST_UPLOAD_DIR") {
        settings.server.upload_dir = v.into();
    }
    if let Some(v) = env.string("BROADCAST_QR_PATH") {
        settings.server.qr_path = v.into();
    }
    if let Some(v) = env.string("BROADCAST_ALLOWED_ORIGINS") {
        settings.server.allowed_origins = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }

    // ── Dispatch ────────────────────────────────────────────────────
    if let Some(v) = env.string("BROADCAST_COUNTRY_CODE") {
        settings.dispatch.country_code = v;
    }
    if let Some(v) = env.u64("BROADCAST_MIN_DELAY_MS", 0, 600_000) {
        settings.dispatch.min_delay_ms = v;
    }
    if let Some(v) = env.u64("BROADCAST_MAX_DELAY_MS", 0, 600_000) {
        settings.dispatch.max_delay_ms = v;
    }

    // ── Janitor ─────────────────────────────────────────────────────
    if let Some(v) = env.bool("BROADCAST_JANITOR_ENABLED") {
        settings.janitor.enabled = v;
    }
    if let Some(v) = env.string("BROADCAST_SESSION_DIR") {
        settings.janitor.session_dir = v.into();
    }
    if let Some(v) = env.u64("BROADCAST_JANITOR_INTERVAL_SECS", 1, 604_800) {
        settings.janitor.interval_secs = v;
    }

    // ── Transport ───────────────────────────────────────────────────
    if let Some(v) = env.string("BROADCAST_TRANSPORT_URL") {
        settings.transport.base_url = v;
    }
    if let Some(v) = env.u64("BROADCAST_TRANSPORT_TIMEOUT_MS", 100, 600_000) {
        settings.transport.timeout_ms = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("BROADCAST_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("BROADCAST_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}
