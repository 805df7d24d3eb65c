//! The `Store` trait — the storage engine's public surface.
//!
//! Implemented by storage backends (e.g. `herald-store-sqlite`). The command
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Every operation is synchronous and self-contained: a backend acquires its
//! connection on entry and releases it on exit, and each mutating statement
//! commits independently. No operation spans another.

use std::fmt;

use crate::record::{Record, Source};

/// The two tables managed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
  Registry,
  Records,
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Registry => "Registry",
      Self::Records => "Records",
    })
  }
}

pub trait Store {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create any missing managed tables. Idempotent; safe to call every run.
  fn ensure_schema(&self) -> Result<(), Self::Error>;

  /// Mirror the registry table onto `sources`, matching rows by identity
  /// columns. A matched row keeps its primary key so existing records keep
  /// their foreign-key linkage; its non-identity attributes are replaced.
  /// Unmatched sources are inserted with an engine-assigned key.
  fn reconcile_registry(&self, sources: &[Source]) -> Result<(), Self::Error>;

  /// Insert records not already known for `source`, marked new. A record
  /// whose identity-column values match an existing row is silently skipped,
  /// never updated — ingestion is additive-only. The source must already
  /// have a registry row.
  fn ingest(&self, records: &[Record], source: &Source) -> Result<(), Self::Error>;

  /// All new records, joined with their owning registry row's attributes,
  /// in insertion order.
  fn fetch_new(&self) -> Result<Vec<Record>, Self::Error>;

  /// Flip every new record to old. The single new→old transition boundary;
  /// no operation ever flips a record back.
  fn sweep_old(&self) -> Result<(), Self::Error>;

  /// Unordered read-back of every managed table, for diagnostic use.
  fn fetch_all_rows(&self) -> Result<Vec<(Table, Vec<Record>)>, Self::Error>;

  /// Unordered read-back of one managed table, for diagnostic use.
  fn fetch_table_rows(&self, table: Table) -> Result<Vec<Record>, Self::Error>;

  /// Drop one managed table. A documented no-op dry run unless `perform`.
  fn drop_table(&self, table: Table, perform: bool) -> Result<(), Self::Error>;

  /// Drop every managed table, with the same `perform` gate.
  fn drop_all(&self, perform: bool) -> Result<(), Self::Error>;
}
