//! Runtime configuration, deserialised from `herald.toml`.

use std::path::PathBuf;

use serde::Deserialize;

use herald_core::{
  Result as CoreResult,
  column::{Column, DataKind, FieldDef},
  record::Source,
};

fn default_notify() -> bool {
  true
}

fn default_max_records() -> usize {
  100
}

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  pub store_path:      PathBuf,
  /// Whether a run delivers notifications before sweeping.
  #[serde(default = "default_notify")]
  pub notify:          bool,
  /// Cap on records kept per source per fetch.
  #[serde(default = "default_max_records")]
  pub max_records:     usize,
  /// JSON file holding the recipient list.
  pub recipients_path: PathBuf,
  pub sources:         Vec<Source>,
  /// Caller-defined columns appended to the records table.
  pub record_fields:   Vec<RecordField>,
}

/// One caller-defined record column.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordField {
  pub name:     String,
  pub kind:     DataKind,
  #[serde(default)]
  pub nullable: bool,
  /// Whether the column participates in duplicate detection.
  #[serde(default)]
  pub identity: bool,
}

impl RecordField {
  pub fn to_column(&self) -> CoreResult<Column> {
    let mut field = FieldDef::new(self.name.as_str(), self.kind)?;
    if self.nullable {
      field = field.nullable();
    }
    if self.identity {
      field = field.identity();
    }
    Ok(Column::Field(field))
  }
}
