//! End-to-end tests: descriptions on disk, dispatch, transactional insert.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use curator::input::Record;
use curator::transform::{builtin, CallingConvention, StructTransformer};
use curator::{
    failure, Curator, CuratorConfig, CuratorError, FailurePolicy, SqliteStore, Store, TableRegistry,
    TransformResult, TransformerRegistry, UnknownColumnPolicy,
};

const LAB_YML: &str = "\
name: lab
description: Laboratory results
columns:
  - name: name
    transform: lab.LabTransformer.name
  - name: value
    transform: lab.LabTransformer.value
    type: decimal
  - name: units
    transform: common.strip
  - name: patient_mrn
    type: integer
";

const VISIT_YML: &str = "\
name: visit
columns:
  - name: visit_id
    transform: common.positive_integer
  - name: admitted_at
    transform: common.datetime
    type: datetime
";

/// Helper to create a directory of description files.
fn write_descriptions(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths = files
        .iter()
        .map(|(name, contents)| {
            let path = dir.path().join(name);
            fs::write(&path, contents).expect("Failed to write description");
            path
        })
        .collect();
    (dir, paths)
}

fn record(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn lab_name(row: &Record) -> TransformResult {
    match row.get("name") {
        Some(Value::String(s)) => TransformResult::success(builtin::normalize_name(s)),
        other => failure("Lab name missing", other.cloned().unwrap_or(Value::Null)),
    }
}

/// Alertness is graded low/medium/high; every other lab is numeric.
fn lab_value(row: &Record) -> TransformResult {
    let raw = row.get("value").cloned().unwrap_or(Value::Null);
    let Some(text) = raw.as_str().map(str::to_lowercase) else {
        return failure("Lab value is not text", raw);
    };

    if lab_name(row).ok() == Some(&json!("alertness")) {
        return match text.trim() {
            "low" => TransformResult::success(0),
            "medium" => TransformResult::success(1),
            "high" => TransformResult::success(2),
            _ => failure("Unknown alertness level", raw),
        };
    }
    match text.trim().parse::<f64>() {
        Ok(v) => TransformResult::success(v),
        Err(_) => failure("Lab value is not numeric", raw),
    }
}

fn transformers() -> TransformerRegistry {
    let mut registry = TransformerRegistry::with_builtins();
    registry.module("lab").structure(
        StructTransformer::builder("LabTransformer")
            .field("name", lab_name)
            .field("value", lab_value)
            .build(),
    );
    registry
}

fn lab_records() -> Vec<Record> {
    vec![
        record(&[
            ("name", json!(" Blood Pressure ")),
            ("value", json!("120")),
            ("units", json!(" mmHg ")),
            ("patient_mrn", json!(1001)),
        ]),
        record(&[
            ("name", json!("Heart Rate")),
            ("value", json!("HIGH")),
            ("units", json!("bpm")),
            ("patient_mrn", json!(1002)),
        ]),
        record(&[
            ("name", json!(" ALERTNESS ")),
            ("value", json!("HIGH")),
            ("units", json!("")),
        ]),
    ]
}

const LAB_DDL: &str = "CREATE TABLE lab (
    name TEXT NOT NULL,
    value REAL,
    units TEXT,
    patient_mrn INTEGER NOT NULL
)";

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_from_directory_and_files() {
    let (dir, paths) = write_descriptions(&[("lab.yml", LAB_YML), ("visit.yaml", VISIT_YML)]);

    let from_dir = Curator::from_paths(&[dir.path()], &transformers()).expect("load dir");
    assert_eq!(from_dir.tables().table_names().collect::<Vec<_>>(), vec!["lab", "visit"]);

    let from_files = Curator::from_paths(&paths, &transformers()).expect("load files");
    assert_eq!(from_files.tables().len(), 2);

    let name = from_files.tables().get_transform("lab", "name").unwrap().unwrap();
    assert_eq!(name.convention(), CallingConvention::Row);
    let visit = from_files.tables().get_transform("visit", "visit_id").unwrap().unwrap();
    assert_eq!(visit.convention(), CallingConvention::Value);
}

#[test]
fn test_no_descriptions() {
    let paths: Vec<PathBuf> = Vec::new();
    let err = Curator::from_paths(&paths, &transformers()).err().expect("empty paths must fail");
    assert!(matches!(err, CuratorError::NoDescriptions));
}

#[test]
fn test_unresolved_reference_fails_load() {
    let (_dir, paths) = write_descriptions(&[(
        "lab.yml",
        "name: lab\ncolumns:\n  - name: name\n    transform: lab.LabTransformer\n",
    )]);
    let err = TableRegistry::load(&paths, &transformers()).unwrap_err();
    match err {
        CuratorError::UnresolvedTransform { reference, reason } => {
            assert_eq!(reference, "lab.LabTransformer");
            assert!(reason.contains("struct transformer"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_schema_error_names_field() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", "name: lab\ncolumns:\n  - name: a\n    type: money\n")]);
    let err = TableRegistry::load(&paths, &transformers()).unwrap_err();
    assert!(matches!(err, CuratorError::Schema { ref field, .. } if field == "columns[0].type"));
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn test_lab_scenario() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", LAB_YML)]);
    let curator = Curator::from_paths(&paths, &transformers()).unwrap();

    let cleaned = curator.transform_records("lab", &lab_records()).unwrap();
    assert_eq!(cleaned.len(), 3);

    assert_eq!(cleaned[0]["name"], TransformResult::success("blood_pressure"));
    assert_eq!(cleaned[0]["value"], TransformResult::success(120.0));
    assert_eq!(cleaned[0]["units"], TransformResult::success("mmHg"));
    assert_eq!(cleaned[0]["patient_mrn"], TransformResult::success(1001));

    // The bad value fails alone; its neighbours are still cleaned
    let failed = cleaned[1]["value"].failure().expect("value should fail");
    assert_eq!(failed.message, "Lab value is not numeric");
    assert_eq!(failed.value, json!("HIGH"));
    assert_eq!(failed.context.as_ref().unwrap().record, 1);
    assert_eq!(cleaned[1]["name"], TransformResult::success("heart_rate"));

    // A struct field may call a sibling field directly
    assert_eq!(cleaned[2]["name"], TransformResult::success("alertness"));
    assert_eq!(cleaned[2]["value"], TransformResult::success(2));

    // Field set follows each record's own keys
    assert_eq!(cleaned[2].keys().collect::<Vec<_>>(), vec!["name", "value", "units"]);

    let failures = Curator::failures(&cleaned);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].to_string().contains("[lab.value, record 1]"));
}

#[test]
fn test_transform_called_once_per_cell() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut registry = TransformerRegistry::new();
    registry.register_value("count.touch", move |v: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        TransformResult::Success(v.clone())
    });
    let (_dir, paths) = write_descriptions(&[("t.yml", "name: t\ncolumns:\n  - name: a\n    transform: count.touch\n  - name: b\n")]);
    let curator = Curator::from_paths(&paths, &registry).unwrap();

    let records: Vec<Record> = (0..5).map(|i| record(&[("a", json!(i)), ("b", json!(i))])).collect();
    let cleaned = curator.transform_records("t", &records).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(cleaned[4]["b"], TransformResult::success(4));
}

#[test]
fn test_panicking_transform_becomes_failure() {
    let mut registry = TransformerRegistry::new();
    registry.register_value("bad.explode", |_: &Value| -> TransformResult { panic!("boom") });
    let (_dir, paths) = write_descriptions(&[("t.yml", "name: t\ncolumns:\n  - name: a\n    transform: bad.explode\n  - name: b\n")]);
    let curator = Curator::from_paths(&paths, &registry).unwrap();

    let cleaned = curator
        .transform_records("t", &[record(&[("a", json!(1)), ("b", json!(2))])])
        .unwrap();
    assert!(cleaned[0]["a"].failure().unwrap().message.contains("boom"));
    assert_eq!(cleaned[0]["b"], TransformResult::success(2));
}

#[test]
fn test_unknown_column_rejected_then_passed_through() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", LAB_YML)]);
    let records = vec![record(&[("name", json!("BP")), ("comment", json!("n/a"))])];

    let strict = Curator::from_paths(&paths, &transformers()).unwrap();
    assert!(matches!(
        strict.transform_records("lab", &records),
        Err(CuratorError::UnknownColumn { .. })
    ));

    let tables = TableRegistry::load(&paths, &transformers()).unwrap();
    let lenient = Curator::with_config(
        tables,
        CuratorConfig {
            unknown_columns: UnknownColumnPolicy::PassThrough,
            ..CuratorConfig::default()
        },
    );
    let cleaned = lenient.transform_records("lab", &records).unwrap();
    assert_eq!(cleaned[0]["comment"], TransformResult::success("n/a"));
}

// =============================================================================
// Insertion
// =============================================================================

fn lab_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("open sqlite");
    store.execute_batch(LAB_DDL).expect("create lab");
    store
}

fn persisting_curator(paths: &[PathBuf], store: SqliteStore) -> Curator {
    let tables = TableRegistry::load(paths, &transformers()).unwrap();
    Curator::with_config(
        tables,
        CuratorConfig {
            failures: FailurePolicy::Persist,
            ..CuratorConfig::default()
        },
    )
    .with_store(store)
}

#[test]
fn test_insert_is_atomic() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", LAB_YML)]);
    let mut curator = persisting_curator(&paths, lab_store());

    // The third record has no patient_mrn and violates NOT NULL
    let err = curator.insert_records("lab", &lab_records()).unwrap_err();
    match err {
        CuratorError::Insertion { table, source } => {
            assert_eq!(table, "lab");
            assert!(matches!(*source, CuratorError::Sqlite(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(curator.store().unwrap().row_count("lab").unwrap(), 0);
}

#[test]
fn test_insert_commits_clean_batch() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", LAB_YML)]);
    let mut curator = Curator::from_paths(&paths, &transformers()).unwrap().with_store(lab_store());

    let records = vec![lab_records().remove(0)];
    assert_eq!(curator.insert_records("lab", &records).unwrap(), 1);

    let store = curator.store().unwrap();
    assert_eq!(store.row_count("lab").unwrap(), 1);
    assert_eq!(store.columns("lab").unwrap(), vec!["name", "value", "units", "patient_mrn"]);
}

#[test]
fn test_insert_refuses_failures_by_default() {
    let (_dir, paths) = write_descriptions(&[("lab.yml", LAB_YML)]);
    let mut curator = Curator::from_paths(&paths, &transformers()).unwrap().with_store(lab_store());

    let records = lab_records()[..2].to_vec();
    let err = curator.insert_records("lab", &records).unwrap_err();
    assert!(matches!(err, CuratorError::FailedRecords { count: 1, .. }));
    assert_eq!(curator.store().unwrap().row_count("lab").unwrap(), 0);
}
