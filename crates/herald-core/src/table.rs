//! Table definitions assembled from column descriptors.

use crate::{
  Error, Result,
  column::{Column, FieldDef},
};

/// An ordered collection of column descriptors for one table.
///
/// The two built-in tables are fixed at engine construction; the records
/// table additionally accepts caller-supplied columns, appended once before
/// any table is physically created.
#[derive(Debug, Clone)]
pub struct TableDef {
  name:    String,
  columns: Vec<Column>,
}

impl TableDef {
  pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
    let name = name.into();
    if name.is_empty() {
      return Err(Error::Config("table name must not be empty".into()));
    }
    let mut table = Self { name, columns: Vec::new() };
    for column in columns {
      table.add_column(column)?;
    }
    Ok(table)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Append a column. Field names must be unique within the table.
  pub fn add_column(&mut self, column: Column) -> Result<()> {
    if let Some(field) = column.field()
      && self
        .columns
        .iter()
        .filter_map(Column::field)
        .any(|existing| existing.name() == field.name())
    {
      return Err(Error::Config(format!(
        "duplicate column `{}` in table `{}`",
        field.name(),
        self.name
      )));
    }
    self.columns.push(column);
    Ok(())
  }

  /// Columns sorted by render priority, highest first. The sort is stable,
  /// so equal priorities keep declaration order — DDL rendering and the
  /// column order of generated SELECTs depend on this.
  pub fn ordered_columns(&self) -> Vec<&Column> {
    let mut ordered: Vec<&Column> = self.columns.iter().collect();
    ordered.sort_by_key(|column| std::cmp::Reverse(column.priority()));
    ordered
  }

  /// Real fields in render order, constraints excluded.
  pub fn ordered_fields(&self) -> Vec<&FieldDef> {
    self
      .ordered_columns()
      .into_iter()
      .filter_map(Column::field)
      .collect()
  }

  /// Fields participating in identity matching, in render order. May be
  /// empty; operations that need a natural key must treat that as an error.
  pub fn identity_fields(&self) -> Vec<&FieldDef> {
    self
      .ordered_fields()
      .into_iter()
      .filter(|field| field.is_identity())
      .collect()
  }

  /// The single primary-key field of this table.
  pub fn primary_key(&self) -> Result<&FieldDef> {
    let mut keys = self
      .columns
      .iter()
      .filter_map(Column::field)
      .filter(|field| field.is_primary_key());
    match (keys.next(), keys.next()) {
      (Some(pk), None) => Ok(pk),
      (None, _) => Err(Error::Config(format!(
        "table `{}` has no primary key",
        self.name
      ))),
      (Some(_), Some(_)) => Err(Error::Config(format!(
        "table `{}` has more than one primary key",
        self.name
      ))),
    }
  }

  /// The idempotent CREATE statement for this table.
  pub fn create_sql(&self) -> String {
    let columns = self
      .ordered_columns()
      .iter()
      .map(|column| column.render())
      .collect::<Vec<_>>()
      .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name, columns)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::column::DataKind;

  fn field(name: &str, kind: DataKind) -> Column {
    Column::Field(FieldDef::new(name, kind).unwrap())
  }

  #[test]
  fn pk_renders_first_and_constraint_last_regardless_of_declaration_order() {
    // Deliberately scrambled: constraint first, primary key last.
    let table = TableDef::new("T", vec![
      Column::Constraint("FOREIGN KEY (b) REFERENCES Other (id)".into()),
      field("a", DataKind::Text),
      field("b", DataKind::Integer),
      Column::Field(FieldDef::new("id", DataKind::Integer).unwrap().primary_key()),
    ])
    .unwrap();

    let rendered: Vec<String> = table
      .ordered_columns()
      .iter()
      .map(|column| column.render())
      .collect();
    assert_eq!(rendered[0], "id INTEGER PRIMARY KEY AUTOINCREMENT");
    assert_eq!(rendered[1], "a TEXT NOT NULL");
    assert_eq!(rendered[2], "b INTEGER NOT NULL");
    assert_eq!(rendered[3], "FOREIGN KEY (b) REFERENCES Other (id)");
  }

  #[test]
  fn create_sql_matches_generated_schema() {
    let table = TableDef::new("Registry", vec![
      Column::Field(FieldDef::new("id", DataKind::Integer).unwrap().primary_key()),
      Column::Field(FieldDef::new("name", DataKind::Text).unwrap().identity()),
      field("url", DataKind::Text),
    ])
    .unwrap();

    assert_eq!(
      table.create_sql(),
      "CREATE TABLE IF NOT EXISTS Registry (id INTEGER PRIMARY KEY AUTOINCREMENT, \
       name TEXT NOT NULL, url TEXT NOT NULL);"
    );
  }

  #[test]
  fn identity_fields_keep_render_order() {
    let table = TableDef::new("T", vec![
      Column::Field(FieldDef::new("first", DataKind::Text).unwrap().identity()),
      field("middle", DataKind::Text),
      Column::Field(FieldDef::new("second", DataKind::Integer).unwrap().identity()),
    ])
    .unwrap();

    let names: Vec<&str> = table
      .identity_fields()
      .iter()
      .map(|field| field.name())
      .collect();
    assert_eq!(names, ["first", "second"]);
  }

  #[test]
  fn duplicate_column_name_rejected() {
    let mut table = TableDef::new("T", vec![field("a", DataKind::Text)]).unwrap();
    let err = table.add_column(field("a", DataKind::Integer)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
  }

  #[test]
  fn missing_primary_key_is_a_config_error() {
    let table = TableDef::new("T", vec![field("a", DataKind::Text)]).unwrap();
    assert!(matches!(table.primary_key(), Err(Error::Config(_))));
  }

  #[test]
  fn multiple_primary_keys_is_a_config_error() {
    let table = TableDef::new("T", vec![
      Column::Field(FieldDef::new("a", DataKind::Integer).unwrap().primary_key()),
      Column::Field(FieldDef::new("b", DataKind::Integer).unwrap().primary_key()),
    ])
    .unwrap();
    assert!(matches!(table.primary_key(), Err(Error::Config(_))));
  }
}
