//! SQLite backend for the Among fish-knowledge store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The merge operation runs inside a
//! single [`rusqlite::Transaction`]; dropping it without commit rolls back,
//! which is what gives the merge its all-or-nothing guarantee.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
