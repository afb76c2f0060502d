//! The fixed schema every table description document must satisfy.
//!
//! ```yaml
//! name: lab                         # identifier, required
//! description: Lab results          # optional
//! columns:                          # non-empty, required
//!   - name: value                   # identifier, required
//!     transform: lab.LabTransformer.value   # dotted path, optional
//!     type: decimal                 # optional
//!     description: Measured value   # optional
//! ```

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{CuratorError, Result};

static SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema: serde_json::Value =
        serde_json::from_str(include_str!("schema.json")).expect("description schema is valid JSON");
    jsonschema::validator_for(&schema).expect("description schema compiles")
});

/// Declared storage type of a column. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Decimal,
    String,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
}

/// Check a parsed document against the table description schema.
///
/// The first violation is reported with the path of the offending field,
/// e.g. `columns[2].transform`.
pub fn validate(doc: &Value, document: &str) -> Result<()> {
    let error = |field: String, message: String| CuratorError::Schema {
        document: document.to_string(),
        field,
        message,
    };

    let instance = serde_json::to_value(doc).map_err(|e| error("$".to_string(), e.to_string()))?;
    match SCHEMA.iter_errors(&instance).next() {
        None => Ok(()),
        Some(violation) => {
            let (field, message) = describe(&violation);
            Err(error(field, message))
        }
    }
}

/// Field path and message for a violation. Missing and unrecognized keys
/// are reported at the key itself rather than at the enclosing mapping.
fn describe(violation: &ValidationError<'_>) -> (String, String) {
    let pointer = violation.instance_path.to_string();
    match &violation.kind {
        ValidationErrorKind::Required { property } => {
            let key = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            (field_path(&pointer, Some(&key)), "is required".to_string())
        }
        ValidationErrorKind::AdditionalProperties { unexpected } if !unexpected.is_empty() => (
            field_path(&pointer, Some(&unexpected[0])),
            "is not a recognized field".to_string(),
        ),
        _ => (field_path(&pointer, None), violation.to_string()),
    }
}

/// Turn a JSON pointer such as `/columns/2/transform` into `columns[2].transform`.
fn field_path(pointer: &str, key: Option<&str>) -> String {
    let mut field = String::new();
    let segments = pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"));
    for segment in segments.chain(key.map(str::to_string)) {
        if segment.parse::<usize>().is_ok() && !field.is_empty() {
            field.push_str(&format!("[{}]", segment));
        } else {
            if !field.is_empty() {
                field.push('.');
            }
            field.push_str(&segment);
        }
    }
    if field.is_empty() { "$".to_string() } else { field }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> std::result::Result<(), (String, String)> {
        let doc: Value = serde_yaml::from_str(source).unwrap();
        validate(&doc, "test.yml").map_err(|e| match e {
            CuratorError::Schema { field, message, .. } => (field, message),
            other => panic!("unexpected error {other:?}"),
        })
    }

    #[test]
    fn test_valid_document() {
        check(
            "name: lab\n\
             columns:\n\
             \x20 - name: name\n\
             \x20   transform: lab.LabTransformer.name\n\
             \x20   type: string\n\
             \x20 - name: patient_mrn\n",
        )
        .unwrap();
    }

    #[test]
    fn test_missing_name() {
        let (field, message) = check("columns:\n  - name: a\n").unwrap_err();
        assert_eq!(field, "name");
        assert_eq!(message, "is required");
    }

    #[test]
    fn test_empty_columns() {
        let (field, _) = check("name: lab\ncolumns: []\n").unwrap_err();
        assert_eq!(field, "columns");
    }

    #[test]
    fn test_unknown_column_key() {
        let (field, _) = check("name: lab\ncolumns:\n  - name: a\n    cleaner: x.y\n").unwrap_err();
        assert_eq!(field, "columns[0].cleaner");
    }

    #[test]
    fn test_bad_transform_reference() {
        let (field, message) = check("name: lab\ncolumns:\n  - name: a\n  - name: b\n    transform: lab..name\n").unwrap_err();
        assert_eq!(field, "columns[1].transform");
        assert!(message.contains("lab..name"));
    }

    #[test]
    fn test_bad_column_type() {
        let (field, _) = check("name: lab\ncolumns:\n  - name: a\n    type: money\n").unwrap_err();
        assert_eq!(field, "columns[0].type");
    }

    #[test]
    fn test_non_identifier_name() {
        let (field, _) = check("name: lab results\ncolumns:\n  - name: a\n").unwrap_err();
        assert_eq!(field, "name");
    }

    #[test]
    fn test_root_must_be_mapping() {
        let (field, _) = check("- name: lab\n").unwrap_err();
        assert_eq!(field, "$");
    }

    #[test]
    fn test_null_optional_fields() {
        check("name: lab\ndescription:\ncolumns:\n  - name: a\n    transform:\n    type:\n").unwrap();
    }

    #[test]
    fn test_field_path() {
        assert_eq!(field_path("", None), "$");
        assert_eq!(field_path("", Some("name")), "name");
        assert_eq!(field_path("/columns/2/transform", None), "columns[2].transform");
        assert_eq!(field_path("/columns/0", Some("cleaner")), "columns[0].cleaner");
    }
}
