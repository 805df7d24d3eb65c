//! Core types and trait definitions for the herald storage engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod column;
pub mod error;
pub mod record;
pub mod store;
pub mod table;

pub use error::{Error, Result};
