//! # Cachepipe Core
//!
//! A caching indirection layer: chainable stages between a caller and an
//! arbitrary key/value backing store, with a bounded write-back cache engine
//! as the one real cache behavior.
//!
//! This crate contains:
//! - The [`CacheLayer`] stage contract and chaining machinery
//! - The [`Passthrough`] identity stage
//! - The [`WriteBackCache`] engine (FIFO eviction, dirty-entry tracking,
//!   flush propagation)
//! - The [`Store`] port and [`StoreLayer`] terminal stage
//! - The [`Pipeline`] builder wiring stages front-to-back
//!
//! ## Architecture Principles
//! - Pure logic; concrete store backends live in adapter crates
//! - Values are an opaque generic payload: the cache stores, clones and
//!   forwards them, never inspects them
//! - A stage's behavior is chosen at construction and never reassigned
//! - Absence is a value (`Ok(None)`), not an error
//!
//! ## Example
//! ```
//! use cachepipe_core::{Pipeline, WriteBackCache};
//! use cachepipe_core::testing::RecordingStore;
//!
//! let store = RecordingStore::seeded([("001", 1), ("002", 2)]);
//! let pipeline = Pipeline::builder()
//!     .layer(WriteBackCache::with_capacity(3)?)
//!     .store(store)
//!     .build()?;
//!
//! assert_eq!(pipeline.read("001")?, Some(1));
//! pipeline.write("002", 20)?; // deferred; persisted on eviction or flush
//! pipeline.flush()?;
//! # Ok::<(), cachepipe_core::CacheError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod cache;
pub mod error;
pub mod layer;
pub mod passthrough;
pub mod pipeline;
pub mod store;
pub mod testing;

// Re-export the public API surface
// ------------------------------------------------
pub use cache::{CacheStats, WriteBackCache, WriteBackConfig, WriteBackConfigBuilder};
pub use error::{CacheError, CacheResult, ErrorClassification, ErrorSeverity};
pub use layer::{CacheLayer, CacheValue, DownstreamLink, LayerId};
pub use passthrough::Passthrough;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use store::{Store, StoreLayer};
