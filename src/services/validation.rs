//! Boundary checks shared by crash and feedback intake.
//!
//! Anything the store would refuse is turned into a validation error here,
//! before a statement is sent.

use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Longest identifier the store accepts for app and user ids
pub const MAX_ID_CHARS: usize = 255;

/// Returns the value if present and not blank
pub fn required<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Rejects a value longer than `max` characters
pub fn check_max_chars(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// Rejects text containing NUL, which Postgres cannot store
pub fn check_text(field: &str, value: Option<&str>) -> AppResult<()> {
    match value {
        Some(v) if v.contains('\0') => Err(AppError::Validation(format!(
            "{} must not contain NUL characters",
            field
        ))),
        _ => Ok(()),
    }
}

/// Rejects a JSON payload with NUL in any string or object key
pub fn check_payload(value: Option<&Value>) -> AppResult<()> {
    match value {
        Some(v) if contains_nul(v) => Err(AppError::Validation(
            "payload must not contain NUL characters".to_string(),
        )),
        _ => Ok(()),
    }
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map
            .iter()
            .any(|(key, v)| key.contains('\0') || contains_nul(v)),
        _ => false,
    }
}
