//! # Cachepipe Infra
//!
//! Concrete store adapters for cachepipe pipelines.
//!
//! This crate contains:
//! - [`MemoryStore`]: an in-memory backend (reference implementation)
//! - [`SqliteStore`]: a SQLite-backed store encoding values as JSON at its
//!   own boundary
//! - [`StoreError`]: adapter error type converting into the pipeline's
//!   [`CacheError`](cachepipe_core::CacheError) with sources preserved
//!
//! The pipeline core never depends on this crate; adapters are mounted at
//! the terminal end of a chain via
//! [`PipelineBuilder::store`](cachepipe_core::PipelineBuilder::store).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod error;
pub mod memory;
pub mod sqlite;

// Re-export the public API surface
// ------------------------------------------------
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
