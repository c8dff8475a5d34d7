//! Recipient number normalization.

/// Trim `raw` and prepend `country_code` unless it already starts with it.
///
/// This is a plain string-prefix check, not phone-number parsing: a local
/// number that happens to begin with the country code digits is left alone.
pub fn normalize_number(raw: &str, country_code: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(country_code) {
        trimmed.to_owned()
    } else {
        format!("{country_code}{trimmed}")
    }
}
