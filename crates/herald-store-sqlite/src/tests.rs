//! Integration tests for `SqliteStore` against an in-memory database.

use herald_core::{
  column::{Column, DataKind, FieldDef},
  record::{Record, Source, Value},
  store::{Store, Table},
};

use crate::{Error, SqliteStore};

fn title_column() -> Column {
  Column::Field(FieldDef::new("title", DataKind::Text).unwrap().identity())
}

fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory(vec![title_column()]).expect("in-memory store");
  s.ensure_schema().expect("schema");
  s
}

fn source(name: &str, url: &str) -> Source {
  Source { name: name.into(), url: url.into() }
}

fn record(title: &str) -> Record {
  let mut record = Record::new();
  record.set("title", Value::from(title));
  record
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[test]
fn ensure_schema_is_idempotent() {
  let s = store();
  s.ensure_schema().unwrap();
  s.ensure_schema().unwrap();

  assert!(s.fetch_table_rows(Table::Registry).unwrap().is_empty());
  assert!(s.fetch_table_rows(Table::Records).unwrap().is_empty());
}

#[test]
fn duplicate_extra_column_rejected_at_open() {
  let err = SqliteStore::open_in_memory(vec![
    Column::Field(FieldDef::new("is_new", DataKind::Boolean).unwrap()),
  ])
  .unwrap_err();
  assert!(matches!(err, Error::Core(_)));
}

// ─── Registry reconciliation ─────────────────────────────────────────────────

#[test]
fn reconcile_inserts_each_source_once() {
  let s = store();
  let sources = [source("X", "https://x.example"), source("Y", "https://y.example")];

  s.reconcile_registry(&sources).unwrap();
  s.reconcile_registry(&sources).unwrap();

  let rows = s.fetch_table_rows(Table::Registry).unwrap();
  assert_eq!(rows.len(), 2);
}

#[test]
fn reconcile_preserves_primary_key_across_attribute_change() {
  // Scenario: source "X" changes its URL between runs.
  let s = store();

  s.reconcile_registry(&[source("X", "v1")]).unwrap();
  let rows = s.fetch_table_rows(Table::Registry).unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
  assert_eq!(rows[0].get("url"), Some(&Value::from("v1")));

  s.reconcile_registry(&[source("X", "v2")]).unwrap();
  let rows = s.fetch_table_rows(Table::Registry).unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
  assert_eq!(rows[0].get("url"), Some(&Value::from("v2")));
}

#[test]
fn records_survive_registry_reconciliation() {
  let s = store();
  let v1 = source("X", "v1");

  s.reconcile_registry(std::slice::from_ref(&v1)).unwrap();
  s.ingest(&[record("A")], &v1).unwrap();

  let v2 = source("X", "v2");
  s.reconcile_registry(std::slice::from_ref(&v2)).unwrap();

  // The row itself survives the transient registry delete: the cascade
  // clause must stay inert during delete-and-reinsert.
  assert_eq!(s.fetch_table_rows(Table::Records).unwrap().len(), 1);

  // And it still joins against its source, now under the new URL.
  let new = s.fetch_new().unwrap();
  assert_eq!(new.len(), 1);
  assert_eq!(new[0].get("title"), Some(&Value::from("A")));
  assert_eq!(new[0].get("source_url"), Some(&Value::from("v2")));
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[test]
fn ingest_without_registry_row_fails() {
  let s = store();
  let err = s.ingest(&[record("A")], &source("X", "u")).unwrap_err();
  assert!(matches!(err, Error::SourceNotFound(name) if name == "X"));
}

#[test]
fn ingest_deduplicates_by_identity() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();

  s.ingest(&[record("A")], &x).unwrap();
  assert_eq!(s.fetch_new().unwrap().len(), 1);

  s.ingest(&[record("A")], &x).unwrap();
  assert_eq!(s.fetch_new().unwrap().len(), 1);
}

#[test]
fn same_title_from_different_sources_is_not_a_duplicate() {
  let s = store();
  let x = source("X", "ux");
  let y = source("Y", "uy");
  s.reconcile_registry(&[x.clone(), y.clone()]).unwrap();

  s.ingest(&[record("A")], &x).unwrap();
  s.ingest(&[record("A")], &y).unwrap();

  assert_eq!(s.fetch_new().unwrap().len(), 2);
}

#[test]
fn ingest_is_additive_even_after_sweep() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();

  s.ingest(&[record("A")], &x).unwrap();
  s.sweep_old().unwrap();

  // Known identity, even though old: skipped, not re-inserted or revived.
  s.ingest(&[record("A")], &x).unwrap();
  assert!(s.fetch_new().unwrap().is_empty());
  assert_eq!(s.fetch_table_rows(Table::Records).unwrap().len(), 1);
}

// ─── fetch_new ───────────────────────────────────────────────────────────────

#[test]
fn fetch_new_joins_source_attributes() {
  let s = store();
  let x = source("X", "https://x.example");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();
  s.ingest(&[record("A")], &x).unwrap();

  let new = s.fetch_new().unwrap();
  assert_eq!(new.len(), 1);
  assert_eq!(new[0].get("title"), Some(&Value::from("A")));
  assert_eq!(new[0].get("is_new"), Some(&Value::Bool(true)));
  assert_eq!(new[0].get("source_name"), Some(&Value::from("X")));
  assert_eq!(new[0].get("source_url"), Some(&Value::from("https://x.example")));
}

#[test]
fn fetch_new_returns_insertion_order() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();
  s.ingest(&[record("A"), record("B"), record("C")], &x).unwrap();

  let titles: Vec<Value> = s
    .fetch_new()
    .unwrap()
    .iter()
    .map(|row| row.get("title").cloned().unwrap())
    .collect();
  assert_eq!(titles, [Value::from("A"), Value::from("B"), Value::from("C")]);
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn sweep_old_flips_every_new_record_exactly_once() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();
  s.ingest(&[record("A"), record("B")], &x).unwrap();

  s.sweep_old().unwrap();

  assert!(s.fetch_new().unwrap().is_empty());
  let rows = s.fetch_table_rows(Table::Records).unwrap();
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|row| row.get("is_new") == Some(&Value::Bool(false))));

  // Sweeping again is a no-op, not an error.
  s.sweep_old().unwrap();
  assert!(s.fetch_new().unwrap().is_empty());
}

#[test]
fn old_records_never_return_to_new() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();
  s.ingest(&[record("A")], &x).unwrap();
  s.sweep_old().unwrap();

  // A fresh record goes through the lifecycle without touching the old one.
  s.ingest(&[record("B")], &x).unwrap();
  let new = s.fetch_new().unwrap();
  assert_eq!(new.len(), 1);
  assert_eq!(new[0].get("title"), Some(&Value::from("B")));
}

// ─── Integrity guards ────────────────────────────────────────────────────────

#[test]
fn ambiguous_registry_identity_is_an_integrity_error() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("store.db");

  let s = SqliteStore::open(&path, vec![title_column()]).unwrap();
  s.ensure_schema().unwrap();
  s.reconcile_registry(&[source("X", "u")]).unwrap();

  // A second connection bypasses the engine and violates the one-row-per-
  // identity contract directly.
  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute("INSERT INTO Registry (name, url) VALUES ('X', 'u2')", [])
    .unwrap();

  let err = s.ingest(&[record("A")], &source("X", "u")).unwrap_err();
  assert!(matches!(err, Error::Integrity { expected: 1, actual: 2, .. }));

  let err = s.reconcile_registry(&[source("X", "u3")]).unwrap_err();
  assert!(matches!(err, Error::Integrity { expected: 1, actual: 2, .. }));
}

#[test]
fn lifecycle_update_expects_exactly_one_row() {
  let s = store();

  // No record 999: the affected-count guard trips.
  let err = s.mark_old(&Value::Integer(999), false).unwrap_err();
  assert!(matches!(err, Error::Integrity { expected: 1, actual: 0, .. }));

  // The bulk-allowed flag skips the check.
  s.mark_old(&Value::Integer(999), true).unwrap();
}

// ─── Diagnostics and drops ───────────────────────────────────────────────────

#[test]
fn fetch_all_rows_covers_both_tables() {
  let s = store();
  let x = source("X", "u");
  s.reconcile_registry(std::slice::from_ref(&x)).unwrap();
  s.ingest(&[record("A")], &x).unwrap();

  let all = s.fetch_all_rows().unwrap();
  assert_eq!(all.len(), 2);
  let (registry, records) = (&all[0], &all[1]);
  assert_eq!(registry.0, Table::Registry);
  assert_eq!(registry.1.len(), 1);
  assert_eq!(records.0, Table::Records);
  assert_eq!(records.1.len(), 1);
}

#[test]
fn drop_table_without_perform_is_a_dry_run() {
  let s = store();
  s.reconcile_registry(&[source("X", "u")]).unwrap();

  s.drop_table(Table::Registry, false).unwrap();
  assert_eq!(s.fetch_table_rows(Table::Registry).unwrap().len(), 1);
}

#[test]
fn drop_all_with_perform_removes_tables() {
  let s = store();
  s.drop_all(true).unwrap();

  let err = s.fetch_table_rows(Table::Registry).unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  // ensure_schema brings the store back from nothing.
  s.ensure_schema().unwrap();
  assert!(s.fetch_table_rows(Table::Registry).unwrap().is_empty());
}
