//! Error type for `herald-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed table or column definitions, surfaced from the core crate.
  #[error("core error: {0}")]
  Core(#[from] herald_core::Error),

  /// A statement matched or affected an unexpected number of rows — a
  /// caller-side identity-design violation. Never retried.
  #[error("integrity violation in {operation}: expected {expected} row(s), got {actual}")]
  Integrity {
    operation: &'static str,
    expected:  usize,
    actual:    usize,
  },

  /// Ingestion referenced a source with no registry row. The caller must
  /// reconcile the registry before ingesting.
  #[error("no registry row for source: {0}")]
  SourceNotFound(String),

  /// Underlying storage failure, propagated unchanged.
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
