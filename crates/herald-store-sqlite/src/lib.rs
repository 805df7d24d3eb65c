//! SQLite backend for the herald storage engine.
//!
//! Fully synchronous: one connection owned by the store, every statement
//! committed on its own via SQLite autocommit.

mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
