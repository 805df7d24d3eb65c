//! Conversions between domain [`Value`]s and SQLite's dynamic types.

use herald_core::{
  column::{DataKind, FieldDef},
  record::{Record, Value},
};
use rusqlite::types::{Value as SqlValue, ValueRef};

/// Convert a domain value into an owned SQLite value for parameter binding.
/// Booleans are stored as integers; SQLite has no native boolean storage.
pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Null => SqlValue::Null,
  }
}

/// A column of a generated SELECT: the key under which the value lands in
/// the decoded [`Record`], plus the declared kind (so BOOLEAN columns can be
/// read back as booleans rather than raw integers).
pub struct SelectColumn {
  pub name: String,
  pub kind: DataKind,
}

impl SelectColumn {
  pub fn of(field: &FieldDef) -> Self {
    Self { name: field.name().to_owned(), kind: field.kind() }
  }

  /// Same field, decoded under a different record key. Used by joins to keep
  /// both sides' columns distinguishable.
  pub fn renamed(field: &FieldDef, name: impl Into<String>) -> Self {
    Self { name: name.into(), kind: field.kind() }
  }
}

fn decode_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Value> {
  let raw = row.get_ref(idx)?;
  match raw {
    ValueRef::Null => Ok(Value::Null),
    ValueRef::Integer(i) => Ok(Value::Integer(i)),
    ValueRef::Text(t) => Ok(Value::Text(String::from_utf8_lossy(t).into_owned())),
    // The closed kind set never declares REAL or BLOB columns.
    other => Err(rusqlite::Error::InvalidColumnType(
      idx,
      format!("column {idx}"),
      other.data_type(),
    )),
  }
}

/// Decode one result row into a [`Record`], positionally matched against the
/// SELECT's column list.
pub fn decode_row(
  row: &rusqlite::Row<'_>,
  columns: &[SelectColumn],
) -> rusqlite::Result<Record> {
  let mut record = Record::new();
  for (idx, column) in columns.iter().enumerate() {
    let mut value = decode_column(row, idx)?;
    if column.kind == DataKind::Boolean
      && let Value::Integer(i) = value
    {
      value = Value::Bool(i != 0);
    }
    record.set(column.name.as_str(), value);
  }
  Ok(record)
}
