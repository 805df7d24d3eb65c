//! [`SqliteStore`] — the SQLite implementation of [`Store`].

use std::path::Path;

use rusqlite::{Connection, params_from_iter};

use herald_core::{
  column::{Column, DataKind, FieldDef},
  record::{Record, Source, Value},
  store::{Store, Table},
  table::TableDef,
};

use crate::{
  Error, Result,
  encode::{SelectColumn, decode_row, encode_value},
};

const COL_IS_NEW: &str = "is_new";
const COL_SOURCE_REF: &str = "source_ref";

/// Prefix applied to registry attributes when they are joined onto record
/// rows, so they never collide with caller-defined record columns.
const JOINED_SOURCE_PREFIX: &str = "source_";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A herald store backed by a single SQLite file.
///
/// Holds the two built-in table definitions and one long-lived connection.
/// Autocommit gives every statement its own commit boundary; no operation
/// spans a transaction.
#[derive(Debug)]
pub struct SqliteStore {
  conn:     Connection,
  registry: TableDef,
  records:  TableDef,
}

impl SqliteStore {
  /// Open (or create) a store at `path`. `extra_columns` are appended to the
  /// records table before any DDL runs; this is the only extension point and
  /// it is applied exactly once.
  pub fn open(path: impl AsRef<Path>, extra_columns: Vec<Column>) -> Result<Self> {
    Self::from_conn(Connection::open(path)?, extra_columns)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory(extra_columns: Vec<Column>) -> Result<Self> {
    Self::from_conn(Connection::open_in_memory()?, extra_columns)
  }

  fn from_conn(conn: Connection, extra_columns: Vec<Column>) -> Result<Self> {
    // Bundled SQLite builds compile with foreign-key enforcement on.
    // It must be off here: reconciliation deletes and re-inserts registry
    // rows under a preserved primary key, and enforcement would cascade
    // that transient delete into the records table.
    conn.pragma_update(None, "foreign_keys", false)?;

    let registry = TableDef::new("Registry", vec![
      Column::Field(FieldDef::new("id", DataKind::Integer)?.primary_key()),
      Column::Field(FieldDef::new("name", DataKind::Text)?.identity()),
      Column::Field(FieldDef::new("url", DataKind::Text)?),
    ])?;

    // `source_ref` participates in identity so deduplication is scoped per
    // source: the same item from two different sources is two records.
    let mut records = TableDef::new("Records", vec![
      Column::Field(FieldDef::new("id", DataKind::Integer)?.primary_key()),
      Column::Field(FieldDef::new(COL_IS_NEW, DataKind::Boolean)?),
      Column::Field(FieldDef::new(COL_SOURCE_REF, DataKind::Integer)?.identity()),
      Column::Constraint(
        "FOREIGN KEY (source_ref) REFERENCES Registry (id) ON DELETE CASCADE".into(),
      ),
    ])?;
    for column in extra_columns {
      records.add_column(column)?;
    }

    Ok(Self { conn, registry, records })
  }

  fn table_def(&self, table: Table) -> &TableDef {
    match table {
      Table::Registry => &self.registry,
      Table::Records => &self.records,
    }
  }

  fn execute(&self, sql: &str, values: Vec<rusqlite::types::Value>) -> Result<usize> {
    tracing::debug!(%sql, "execute");
    Ok(self.conn.execute(sql, params_from_iter(values))?)
  }

  /// Insert one row built from `record`'s entries, in their own order.
  fn insert_row(&self, record: &Record, table: &str) -> Result<()> {
    let mut names = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());
    for (name, value) in record.iter() {
      names.push(name);
      values.push(encode_value(value));
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
      "INSERT INTO {} ({}) VALUES ({})",
      table,
      names.join(", "),
      placeholders
    );
    self.execute(&sql, values)?;
    Ok(())
  }

  /// Build `name = ? AND ...` over `fields`, pulling values from `attrs`.
  fn identity_clause(
    fields: &[&FieldDef],
    attrs: &Record,
  ) -> (String, Vec<rusqlite::types::Value>) {
    let mut clauses = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
      clauses.push(format!("{} = ?", field.name()));
      values.push(encode_value(attrs.get(field.name()).unwrap_or(&Value::Null)));
    }
    (clauses.join(" AND "), values)
  }

  /// Look up the registry row matching `source`'s identity columns.
  ///
  /// More than one match means the caller's identity design is violated and
  /// surfaces as an integrity error rather than silently picking a row.
  fn find_registry_match(&self, source: &Source) -> Result<Option<Record>> {
    let identity = self.registry.identity_fields();
    if identity.is_empty() {
      return Err(Error::Core(herald_core::Error::Config(
        "registry table has no identity columns".into(),
      )));
    }

    let (clause, values) = Self::identity_clause(&identity, &source.attributes());
    let fields = self.registry.ordered_fields();
    let columns: Vec<SelectColumn> = fields.iter().map(|f| SelectColumn::of(f)).collect();
    let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    let sql = format!(
      "SELECT {} FROM {} WHERE {}",
      names.join(", "),
      self.registry.name(),
      clause
    );
    tracing::debug!(%sql, "query");

    let mut stmt = self.conn.prepare(&sql)?;
    let mut rows = stmt
      .query_map(params_from_iter(values), |row| decode_row(row, &columns))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    match rows.len() {
      0 => Ok(None),
      1 => Ok(rows.pop()),
      n => Err(Error::Integrity {
        operation: "registry identity lookup",
        expected:  1,
        actual:    n,
      }),
    }
  }

  /// Flip one record row to old. Exactly one row must be affected unless
  /// `allow_multiple` is set, in which case the check is skipped.
  pub(crate) fn mark_old(&self, id: &Value, allow_multiple: bool) -> Result<()> {
    let pk = self.records.primary_key()?;
    let sql = format!(
      "UPDATE {} SET {} = ? WHERE {} = ?",
      self.records.name(),
      COL_IS_NEW,
      pk.name()
    );
    let affected = self.execute(&sql, vec![
      encode_value(&Value::Bool(false)),
      encode_value(id),
    ])?;
    if affected != 1 && !allow_multiple {
      return Err(Error::Integrity {
        operation: "record lifecycle sweep",
        expected:  1,
        actual:    affected,
      });
    }
    Ok(())
  }
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;

  fn ensure_schema(&self) -> Result<()> {
    for table in [&self.registry, &self.records] {
      let sql = table.create_sql();
      tracing::debug!(%sql, "create table");
      self.conn.execute_batch(&sql)?;
    }
    Ok(())
  }

  fn reconcile_registry(&self, sources: &[Source]) -> Result<()> {
    let pk = self.registry.primary_key()?;

    for source in sources {
      let attrs = source.attributes();
      let mut row = Record::new();
      for field in self.registry.ordered_fields() {
        if field.is_primary_key() {
          continue;
        }
        row.set(
          field.name(),
          attrs.get(field.name()).cloned().unwrap_or(Value::Null),
        );
      }

      match self.find_registry_match(source)? {
        Some(existing) => {
          let id = existing.get(pk.name()).cloned().unwrap_or(Value::Null);

          // Delete-and-reinsert under the old key instead of UPDATE; the
          // preserved key keeps existing records pointing at this source.
          let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.registry.name(),
            pk.name()
          );
          let affected = self.execute(&sql, vec![encode_value(&id)])?;
          if affected > 1 {
            return Err(Error::Integrity {
              operation: "registry reconcile delete",
              expected:  1,
              actual:    affected,
            });
          }
          // affected == 0: row already gone, accepted; re-insert either way.

          row.set(pk.name(), id);
          self.insert_row(&row, self.registry.name())?;
          tracing::debug!(source = %source.name, "registry row replaced");
        }
        None => {
          self.insert_row(&row, self.registry.name())?;
          tracing::debug!(source = %source.name, "registry row created");
        }
      }
    }
    Ok(())
  }

  fn ingest(&self, records: &[Record], source: &Source) -> Result<()> {
    let registry_pk = self.registry.primary_key()?;
    let identity = self.records.identity_fields();
    if identity.is_empty() {
      return Err(Error::Core(herald_core::Error::Config(
        "records table has no identity columns".into(),
      )));
    }

    for record in records {
      let owner = self
        .find_registry_match(source)?
        .ok_or_else(|| Error::SourceNotFound(source.name.clone()))?;
      let source_ref = owner
        .get(registry_pk.name())
        .cloned()
        .unwrap_or(Value::Null);

      let mut row = record.clone();
      row.set(COL_SOURCE_REF, source_ref);

      let (clause, values) = Self::identity_clause(&identity, &row);
      let sql = format!(
        "SELECT 1 FROM {} WHERE {}",
        self.records.name(),
        clause
      );
      tracing::debug!(%sql, "dedup check");
      let mut stmt = self.conn.prepare(&sql)?;
      let known = stmt
        .query_map(params_from_iter(values), |_| Ok(()))?
        .next()
        .transpose()?
        .is_some();

      if known {
        tracing::debug!(source = %source.name, "duplicate record skipped");
        continue;
      }

      row.set(COL_IS_NEW, Value::Bool(true));
      self.insert_row(&row, self.records.name())?;
    }
    Ok(())
  }

  fn fetch_new(&self) -> Result<Vec<Record>> {
    let records_pk = self.records.primary_key()?;
    let registry_pk = self.registry.primary_key()?;

    let record_fields = self.records.ordered_fields();
    let registry_fields: Vec<&FieldDef> = self
      .registry
      .ordered_fields()
      .into_iter()
      .filter(|field| !field.is_primary_key())
      .collect();

    let mut select: Vec<String> = record_fields
      .iter()
      .map(|field| format!("r.{}", field.name()))
      .collect();
    select.extend(registry_fields.iter().map(|field| format!("s.{}", field.name())));

    let mut columns: Vec<SelectColumn> =
      record_fields.iter().map(|f| SelectColumn::of(f)).collect();
    columns.extend(registry_fields.iter().map(|field| {
      SelectColumn::renamed(field, format!("{JOINED_SOURCE_PREFIX}{}", field.name()))
    }));

    let sql = format!(
      "SELECT {} FROM {} r JOIN {} s ON r.{} = s.{} WHERE r.{} = 1 ORDER BY r.{}",
      select.join(", "),
      self.records.name(),
      self.registry.name(),
      COL_SOURCE_REF,
      registry_pk.name(),
      COL_IS_NEW,
      records_pk.name()
    );
    tracing::debug!(%sql, "query");

    let mut stmt = self.conn.prepare(&sql)?;
    let rows = stmt
      .query_map([], |row| decode_row(row, &columns))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn sweep_old(&self) -> Result<()> {
    let pk = self.records.primary_key()?;
    for row in self.fetch_new()? {
      let id = row.get(pk.name()).cloned().unwrap_or(Value::Null);
      self.mark_old(&id, false)?;
    }
    Ok(())
  }

  fn fetch_all_rows(&self) -> Result<Vec<(Table, Vec<Record>)>> {
    [Table::Registry, Table::Records]
      .into_iter()
      .map(|table| Ok((table, self.fetch_table_rows(table)?)))
      .collect()
  }

  fn fetch_table_rows(&self, table: Table) -> Result<Vec<Record>> {
    let def = self.table_def(table);
    let fields = def.ordered_fields();
    let columns: Vec<SelectColumn> = fields.iter().map(|f| SelectColumn::of(f)).collect();
    let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    let sql = format!("SELECT {} FROM {}", names.join(", "), def.name());
    tracing::debug!(%sql, "query");

    let mut stmt = self.conn.prepare(&sql)?;
    let rows = stmt
      .query_map([], |row| decode_row(row, &columns))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn drop_table(&self, table: Table, perform: bool) -> Result<()> {
    let def = self.table_def(table);
    if !perform {
      tracing::info!(table = def.name(), "dry run, table not dropped");
      return Ok(());
    }
    let sql = format!("DROP TABLE IF EXISTS {}", def.name());
    self.execute(&sql, Vec::new())?;
    tracing::info!(table = def.name(), "table dropped");
    Ok(())
  }

  fn drop_all(&self, perform: bool) -> Result<()> {
    for table in [Table::Registry, Table::Records] {
      self.drop_table(table, perform)?;
    }
    Ok(())
  }
}
