//! Bounded write-back caching with FIFO eviction.
//!
//! This module provides the pipeline's one real cache behavior:
//! [`WriteBackCache`] absorbs writes without touching the backing store,
//! tracks which entries are dirty, and defers persistence to eviction or an
//! explicit flush.
//!
//! # Features
//!
//! - **Write-back**: writes are coalesced in memory; each dirty entry is
//!   written downstream at most once per eviction/flush cycle
//! - **Bounded**: at most `capacity` entries; inserting beyond capacity
//!   evicts first
//! - **FIFO eviction**: the oldest-inserted key is evicted, regardless of
//!   access patterns (deterministic, O(1) per operation)
//! - **Metrics**: optional hit/miss/eviction/write-back counters
//!
//! # Examples
//!
//! ```
//! use cachepipe_core::{Pipeline, WriteBackCache};
//! use cachepipe_core::testing::RecordingStore;
//!
//! let store = RecordingStore::seeded([("alpha", 1)]);
//! let pipeline = Pipeline::builder()
//!     .layer(WriteBackCache::with_capacity(128)?)
//!     .store(store)
//!     .build()?;
//!
//! assert_eq!(pipeline.read("alpha")?, Some(1)); // miss, fetched from store
//! assert_eq!(pipeline.read("alpha")?, Some(1)); // hit, no store call
//!
//! pipeline.write("beta", 2)?; // absorbed, store untouched
//! pipeline.flush()?; // now persisted
//! # Ok::<(), cachepipe_core::CacheError>(())
//! ```
//!
//! # Why FIFO and not LRU
//!
//! FIFO keeps every operation O(1) and makes eviction order deterministic
//! for testing. The cache exists for write coalescing and miss avoidance on
//! bursty access patterns, not for recency/frequency-sensitive workloads.

mod config;
mod engine;
mod stats;

pub use config::{WriteBackConfig, WriteBackConfigBuilder};
pub use engine::WriteBackCache;
pub use stats::CacheStats;
