//! Log sanitization utilities
//!
//! Keeps credentials out of debug/error logs. Request bodies sent during
//! onboarding and the string-encoded `data` payloads of object stores both
//! carry passwords, so anything that reaches a log line goes through
//! [`sanitize_for_log`] first.

use serde_json::Value;

/// Maximum number of bytes to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Replacement for redacted values.
const REDACTED: &str = "***";

/// Keys whose values are never logged.
const SECRET_KEYS: &[&str] = &["password"];

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Returns the original string if it's within the limit,
/// otherwise returns the first `TRUNCATE_LIMIT` bytes with a suffix
/// indicating the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Redact secret values in a JSON value, in place.
///
/// String values that themselves hold a JSON object (the `data` payload
/// convention) are decoded, redacted and re-encoded.
pub fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact_secrets(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        Value::String(s) if s.trim_start().starts_with('{') => {
            if let Ok(mut nested) = serde_json::from_str::<Value>(s) {
                redact_secrets(&mut nested);
                *s = nested.to_string();
            }
        }
        _ => {}
    }
}

/// Redact and truncate a request or response body for logging.
///
/// Non-JSON bodies (log contents, error pages) are only truncated.
pub fn sanitize_for_log(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut value) if value.is_object() || value.is_array() => {
            redact_secrets(&mut value);
            truncate_for_log(&value.to_string())
        }
        _ => truncate_for_log(body),
    }
}
