//! Values, record rows, and source descriptors.

use std::fmt;

use serde::{Deserialize, Serialize, ser::SerializeMap};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single storable value, mirroring the closed set of column data kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Bool(bool),
  Integer(i64),
  Text(String),
  Null,
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(b) => write!(f, "{b}"),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Text(s) => f.write_str(s),
      Self::Null => f.write_str("NULL"),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Self::Text(s.to_owned())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Self::Text(s)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Self::Integer(i)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Self::Bool(b)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One row's worth of values keyed by column name.
///
/// Keeps insertion order. Rows are a handful of columns wide, so a vector of
/// pairs beats a map here; the engine iterates schema-side anyway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<(String, Value)>);

impl Record {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a column value, replacing any existing value for that name.
  pub fn set(&mut self, name: impl Into<String>, value: Value) {
    let name = name.into();
    match self.0.iter_mut().find(|(existing, _)| *existing == name) {
      Some(entry) => entry.1 = value,
      None => self.0.push((name, value)),
    }
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self
      .0
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, value)| value)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(name, value)| (name.as_str(), value))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(String, Value)> for Record {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    let mut record = Self::new();
    for (name, value) in iter {
      record.set(name, value);
    }
    record
  }
}

impl Serialize for Record {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (name, value) in &self.0 {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A configured content source, mirrored into the registry table.
///
/// `name` is the identity attribute used for upsert matching; `url` may
/// change between runs without the registry row losing its primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub name: String,
  pub url:  String,
}

impl Source {
  /// Registry attribute values keyed by column name.
  pub fn attributes(&self) -> Record {
    let mut record = Record::new();
    record.set("name", Value::Text(self.name.clone()));
    record.set("url", Value::Text(self.url.clone()));
    record
  }
}
