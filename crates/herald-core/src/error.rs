//! Error type for `herald-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A malformed column or table definition. Raised at setup time, fatal,
  /// never retried.
  #[error("configuration error: {0}")]
  Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
