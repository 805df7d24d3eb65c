//! Column descriptors and their DDL fragment rendering.
//!
//! A column is described once at engine-configuration time and never mutated
//! afterwards. Rendering is a pure function of the descriptor's data.

use serde::Deserialize;

use crate::{Error, Result};

// ─── Data kinds ──────────────────────────────────────────────────────────────

/// The closed set of column data kinds understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
  Integer,
  Text,
  Boolean,
}

impl DataKind {
  /// The DDL keyword emitted for this kind.
  pub fn keyword(self) -> &'static str {
    match self {
      Self::Integer => "INTEGER",
      Self::Text => "TEXT",
      Self::Boolean => "BOOLEAN",
    }
  }
}

// ─── Field descriptor ────────────────────────────────────────────────────────

/// Render priority of constraint pseudo-columns. Constraint clauses must
/// follow column definitions in DDL, so they always sort last.
pub const CONSTRAINT_PRIORITY: i32 = i32::MIN;

/// One real column of a table definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
  name:        String,
  kind:        DataKind,
  nullable:    bool,
  primary_key: bool,
  identity:    bool,
  priority:    i32,
  extra:       Vec<String>,
}

impl FieldDef {
  /// Create a non-nullable ordinary column at default render priority.
  pub fn new(name: impl Into<String>, kind: DataKind) -> Result<Self> {
    let name = name.into();
    if name.is_empty() {
      return Err(Error::Config("column name must not be empty".into()));
    }
    Ok(Self {
      name,
      kind,
      nullable: false,
      primary_key: false,
      identity: false,
      priority: 0,
      extra: Vec::new(),
    })
  }

  /// Mark this column as the table's primary key.
  ///
  /// The render priority is bumped so the column sorts before every ordinary
  /// column in generated DDL. A rendering-order rule only, not a semantic one.
  pub fn primary_key(mut self) -> Self {
    self.primary_key = true;
    self.priority += 1;
    self
  }

  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  /// Include this column in the natural key used for dedup and upsert
  /// matching, as opposed to the engine-assigned primary key.
  pub fn identity(mut self) -> Self {
    self.identity = true;
    self
  }

  /// Append a raw DDL fragment rendered verbatim after the column clauses.
  pub fn extra_attr(mut self, attr: impl Into<String>) -> Self {
    self.extra.push(attr.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> DataKind {
    self.kind
  }

  pub fn is_primary_key(&self) -> bool {
    self.primary_key
  }

  pub fn is_identity(&self) -> bool {
    self.identity
  }

  pub fn priority(&self) -> i32 {
    self.priority
  }

  /// Render the DDL fragment, e.g. `id INTEGER PRIMARY KEY AUTOINCREMENT`.
  ///
  /// The NOT NULL clause is omitted for nullable columns and for the primary
  /// key (primary keys are implicitly non-null).
  pub fn render(&self) -> String {
    let mut rv = format!("{} {}", self.name, self.kind.keyword());
    if !self.nullable && !self.primary_key {
      rv.push_str(" NOT NULL");
    }
    if self.primary_key {
      rv.push_str(" PRIMARY KEY AUTOINCREMENT");
    }
    for attr in &self.extra {
      rv.push(' ');
      rv.push_str(attr);
    }
    rv
  }
}

// ─── Column ──────────────────────────────────────────────────────────────────

/// A column slot in a table definition: either a real field or a raw
/// table-level constraint clause (e.g. a foreign key).
#[derive(Debug, Clone)]
pub enum Column {
  Field(FieldDef),
  /// Rendered verbatim, always after every field.
  Constraint(String),
}

impl Column {
  pub fn field(&self) -> Option<&FieldDef> {
    match self {
      Self::Field(field) => Some(field),
      Self::Constraint(_) => None,
    }
  }

  pub fn priority(&self) -> i32 {
    match self {
      Self::Field(field) => field.priority(),
      Self::Constraint(_) => CONSTRAINT_PRIORITY,
    }
  }

  pub fn render(&self) -> String {
    match self {
      Self::Field(field) => field.render(),
      Self::Constraint(clause) => clause.clone(),
    }
  }
}
