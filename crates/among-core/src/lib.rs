//! Core types and trait definitions for the Among fish-knowledge store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// Store methods return `impl Future + Send` rather than `async fn` so the
// trait stays usable from multi-threaded runtimes without extra bounds.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod fish;
pub mod merge;
pub mod record;
pub mod store;
pub mod tribe;

pub use error::{Error, Result};
