//! Built-in transforms, registered under the `common` module.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::input::DataTable;

use super::registry::TransformerRegistry;
use super::result::{failure, TransformResult};

/// Digits with optional thousands separators.
static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(,\d{3})*$|^\d+$").expect("valid number pattern"));

/// Formats tried, in order, by `common.datetime`.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %I:%M%p",
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %I:%M%p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Two-digit years are tried before four-digit ones; `%Y` also accepts `17`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// Register every built-in transform.
pub fn register(registry: &mut TransformerRegistry) {
    registry
        .module("common")
        .value("strip", strip)
        .value("lowercase", lowercase)
        .value("snake_case", snake_case)
        .value("positive_integer", positive_integer)
        .value("integer", integer)
        .value("float", float)
        .value("datetime", datetime)
        .value("null_if_missing", null_if_missing);
}

/// Trim surrounding whitespace.
pub fn strip(raw: &Value) -> TransformResult {
    match raw {
        Value::String(s) => TransformResult::success(s.trim()),
        other => failure("Expected a string", other.clone()),
    }
}

pub fn lowercase(raw: &Value) -> TransformResult {
    match raw {
        Value::String(s) => TransformResult::success(s.to_lowercase()),
        other => failure("Expected a string", other.clone()),
    }
}

/// `" Blood Pressure "` → `"blood_pressure"`.
pub fn snake_case(raw: &Value) -> TransformResult {
    match raw {
        Value::String(s) => TransformResult::success(normalize_name(s)),
        other => failure("Expected a string", other.clone()),
    }
}

/// Lowercase whitespace-separated tokens joined with underscores.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Integers above zero, or digit strings such as `"1,024"`.
pub fn positive_integer(raw: &Value) -> TransformResult {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) if i > 0 => TransformResult::success(i),
            Some(_) => failure("Value should be positive", raw.clone()),
            None => failure("Unsure how to handle value type", raw.clone()),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.contains('-') {
                return failure("String looks negative", raw.clone());
            }
            if !NUMBER_PATTERN.is_match(trimmed) {
                return failure("Failed to match pattern", raw.clone());
            }
            match trimmed.replace(',', "").parse::<i64>() {
                Ok(0) => failure("Value should be positive", raw.clone()),
                Ok(i) => TransformResult::success(i),
                Err(e) => failure(format!("Not an integer: {}", e), raw.clone()),
            }
        }
        _ => failure("Unsure how to handle value type", raw.clone()),
    }
}

pub fn integer(raw: &Value) -> TransformResult {
    match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => TransformResult::Success(raw.clone()),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => TransformResult::success(i),
            Err(e) => failure(format!("Not an integer: {}", e), raw.clone()),
        },
        _ => failure("Unsure how to handle value type", raw.clone()),
    }
}

pub fn float(raw: &Value) -> TransformResult {
    match raw {
        Value::Number(n) => match n.as_f64() {
            Some(f) => TransformResult::success(f),
            None => failure("Not representable as a float", raw.clone()),
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => TransformResult::success(f),
            Ok(_) => failure("Not a finite number", raw.clone()),
            Err(e) => failure(format!("Not a number: {}", e), raw.clone()),
        },
        _ => failure("Unsure how to handle value type", raw.clone()),
    }
}

/// Parse a date or date-time into `YYYY-MM-DDTHH:MM:SS`.
pub fn datetime(raw: &Value) -> TransformResult {
    let Some(s) = raw.as_str() else {
        return failure("Expected a string", raw.clone());
    };
    match parse_datetime(s.trim()) {
        Some(dt) => TransformResult::success(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => failure("Unrecognized date format", raw.clone()),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Null for NA-like strings (`""`, `NA`, `null`, ...); anything else as given.
pub fn null_if_missing(raw: &Value) -> TransformResult {
    match raw {
        Value::String(s) if DataTable::is_null_value(s) => TransformResult::Success(Value::Null),
        other => TransformResult::Success(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case(&json!(" Blood Pressure ")), TransformResult::success("blood_pressure"));
        assert_eq!(snake_case(&json!("ALERTNESS")), TransformResult::success("alertness"));
        assert!(snake_case(&json!(3)).is_failure());
    }

    #[test]
    fn test_snake_case_idempotent() {
        let once = snake_case(&json!("  Heart   Rate")).ok().cloned().unwrap();
        assert_eq!(snake_case(&once), TransformResult::Success(once.clone()));
    }

    #[test]
    fn test_positive_integer() {
        assert_eq!(positive_integer(&json!(10)), TransformResult::success(10));
        assert_eq!(positive_integer(&json!("1,024")), TransformResult::success(1024));
        assert_eq!(positive_integer(&json!("42")), TransformResult::success(42));

        let negative = positive_integer(&json!("-5"));
        assert_eq!(negative.failure().unwrap().message, "String looks negative");
        assert!(positive_integer(&json!(0)).is_failure());
        assert!(positive_integer(&json!("abc")).is_failure());
        assert!(positive_integer(&json!(10.1)).is_failure());
    }

    #[test]
    fn test_float_and_integer() {
        assert_eq!(float(&json!("120")), TransformResult::success(120.0));
        assert_eq!(float(&json!(" 10.5 ")), TransformResult::success(10.5));
        assert!(float(&json!("HIGH")).is_failure());
        assert_eq!(integer(&json!("7")), TransformResult::success(7));
        assert!(integer(&json!("7.5")).is_failure());
    }

    #[test]
    fn test_datetime_formats() {
        assert_eq!(
            datetime(&json!("09/03/17 10:30AM")),
            TransformResult::success("2017-09-03T10:30:00")
        );
        assert_eq!(
            datetime(&json!("2017-10-04 17:30:00")),
            TransformResult::success("2017-10-04T17:30:00")
        );
        assert_eq!(datetime(&json!("2017-10-04")), TransformResult::success("2017-10-04T00:00:00"));
        assert!(datetime(&json!("yesterday")).is_failure());
    }

    #[test]
    fn test_null_if_missing() {
        assert_eq!(null_if_missing(&json!("N/A")), TransformResult::Success(Value::Null));
        assert_eq!(null_if_missing(&json!("0")), TransformResult::success("0"));
    }

    #[test]
    fn test_register_builtins() {
        let registry = TransformerRegistry::with_builtins();
        for name in ["strip", "lowercase", "snake_case", "positive_integer", "integer", "float", "datetime", "null_if_missing"] {
            assert!(registry.contains(&format!("common.{}", name)), "missing common.{}", name);
        }
    }
}
