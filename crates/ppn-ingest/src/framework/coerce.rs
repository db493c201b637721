//! Field coercion rules shared by every normalizer
//!
//! Optional fields degrade to `None` on blank or malformed input so one bad
//! cell only loses that cell. Required fields turn the same input into a
//! [`Rejection`] for the whole row.

use serde_json::Value;

use crate::error::Rejection;

/// Literal values (case-insensitive) that mean `false`; everything else is `true`.
pub const FALSE_LITERALS: [&str; 4] = ["false", "0", "no", "f"];

/// Trimmed string, `None` when absent or blank
pub fn text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Finite float, `None` when absent, blank or malformed
pub fn float(raw: Option<&str>) -> Option<f64> {
    let value: f64 = text(raw)?.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Integer, `None` when absent, blank or malformed
///
/// Accepts float notation and truncates toward zero (`"12.0"` and `"12.7"`
/// both give 12), matching how spreadsheet exports write whole numbers.
pub fn integer(raw: Option<&str>) -> Option<i64> {
    let value = float(raw)?.trunc();
    if value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Boolean with a default of `true`
///
/// Only the [`FALSE_LITERALS`] turn a flag off; an absent flag means
/// "usable unless told otherwise".
pub fn flag(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        Some(value) => !FALSE_LITERALS
            .iter()
            .any(|literal| value.eq_ignore_ascii_case(literal)),
        None => true,
    }
}

/// Required trimmed string
pub fn required_text(raw: Option<&str>, field: &'static str) -> Result<String, Rejection> {
    text(raw).ok_or(Rejection::MissingRequiredField(field))
}

/// Required strictly positive integer
///
/// Blank is a missing field; malformed or non-positive is an invalid one.
pub fn required_positive_integer(raw: Option<&str>, field: &'static str) -> Result<i64, Rejection> {
    let trimmed = text(raw).ok_or(Rejection::MissingRequiredField(field))?;
    match integer(Some(&trimmed)) {
        Some(value) if value > 0 => Ok(value),
        _ => Err(Rejection::invalid(field, trimmed)),
    }
}

/// String from a JSON value that may be absent, null or another type
pub fn json_text(value: Option<&Value>) -> Option<String> {
    text(value?.as_str())
}

/// Integer from a JSON number or numeric string
pub fn json_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| integer(Some(&f.to_string())))
        }),
        Value::String(s) => integer(Some(s)),
        _ => None,
    }
}

/// First `max_chars` characters of `value`, never splitting a code point
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
