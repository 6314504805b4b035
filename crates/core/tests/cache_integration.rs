//! Integration tests for the write-back cache pipeline.
//!
//! Exercises full chains (passthrough → write-back cache → store) against a
//! recording store double, covering FIFO eviction, dirty write-back, stale
//! reads, flush idempotence and failure propagation.

use std::sync::Arc;

use cachepipe_core::testing::{FailingStore, RecordingStore};
use cachepipe_core::{
    CacheError, CacheLayer, Passthrough, Pipeline, WriteBackCache, WriteBackConfig,
};

/// Route cache tracing through the test harness when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Store seeded with "001" → 1 … "009" → 9.
fn seeded_store() -> Arc<RecordingStore<i32>> {
    Arc::new(RecordingStore::seeded((1..=9).map(|i| (format!("{i:03}"), i))))
}

fn cache_over(store: &Arc<RecordingStore<i32>>, capacity: usize) -> Pipeline<i32> {
    Pipeline::builder()
        .layer(WriteBackCache::with_capacity(capacity).unwrap())
        .store(Arc::clone(store))
        .build()
        .unwrap()
}

/// Verifies that a miss fetches from the store once and a repeated read is
/// served from cache.
///
/// # Test Steps
/// 1. Read "001" through a cold cache: one store read, value 1
/// 2. Read "001" again: same value, still only one store read
#[test]
fn test_read_miss_then_hit_uses_store_once() {
    init_tracing();
    let store = seeded_store();
    let pipeline = cache_over(&store, 3);

    assert_eq!(pipeline.read("001").unwrap(), Some(1));
    assert_eq!(store.read_count("001"), 1);

    assert_eq!(pipeline.read("001").unwrap(), Some(1));
    assert_eq!(store.read_count("001"), 1);
}

/// Verifies the stale-read property: a cached value shadows out-of-band
/// store changes until the key is evicted and re-fetched.
///
/// # Test Steps
/// 1. Cache "001" via a read (clean entry)
/// 2. Change the store copy to 666 behind the cache's back
/// 3. Read "001": still the stale cached 1
/// 4. Read "002", "003", "004": FIFO (capacity 3) evicts the clean "001"
///    with zero store writes
/// 5. Read "001" again: a miss now, fetches the new 666
#[test]
fn test_stale_read_until_eviction() {
    let store = seeded_store();
    let pipeline = cache_over(&store, 3);

    assert_eq!(pipeline.read("001").unwrap(), Some(1));

    store.set_direct("001", 666);
    assert_eq!(pipeline.read("001").unwrap(), Some(1)); // stale hit

    pipeline.read("002").unwrap();
    pipeline.read("003").unwrap();
    pipeline.read("004").unwrap(); // evicts clean "001"

    assert!(store.writes().is_empty());
    assert_eq!(pipeline.read("001").unwrap(), Some(666));
}

/// Verifies write-back: writes are absorbed until a dirty entry is evicted,
/// which persists it downstream before discarding.
///
/// # Test Steps
/// 1. Write "001" → 101, "002" → 102, "003" → 103: store untouched
/// 2. Write "004": FIFO evicts the dirty "001", writing 101 through first
/// 3. Store now holds "001" → 101 and nothing else from this batch
#[test]
fn test_dirty_eviction_persists_before_discard() {
    init_tracing();
    let store: Arc<RecordingStore<i32>> = Arc::new(RecordingStore::new());
    let pipeline = cache_over(&store, 3);

    pipeline.write("001", 101).unwrap();
    pipeline.write("002", 102).unwrap();
    pipeline.write("003", 103).unwrap();
    assert!(store.writes().is_empty());

    pipeline.write("004", 104).unwrap();
    assert_eq!(store.writes(), vec![("001".to_string(), 101)]);
    assert_eq!(store.get_direct("001"), Some(101));
    assert_eq!(store.get_direct("002"), None);
}

/// Verifies that a write followed by a read on the same stage is a cache
/// hit with no store traffic at all.
#[test]
fn test_write_then_read_never_touches_store() {
    let store: Arc<RecordingStore<String>> = Arc::new(RecordingStore::new());
    let pipeline = Pipeline::builder()
        .layer(WriteBackCache::with_capacity(3).unwrap())
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    pipeline.write("keyA", "valueA1".to_string()).unwrap();
    assert_eq!(pipeline.read("keyA").unwrap().as_deref(), Some("valueA1"));

    assert!(store.reads().is_empty());
    assert!(store.writes().is_empty());
}

/// Verifies flush idempotence: the first flush writes each dirty entry
/// exactly once and clears its flag; a repeated flush writes nothing.
///
/// # Test Steps
/// 1. Write "keyA" → "v1" and flush: exactly one store write, one store
///    flush
/// 2. Flush again with no intervening write: zero further writes, but the
///    flush itself still propagates
#[test]
fn test_flush_is_idempotent() {
    let store: Arc<RecordingStore<String>> = Arc::new(RecordingStore::new());
    let pipeline = Pipeline::builder()
        .layer(WriteBackCache::with_capacity(3).unwrap())
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    pipeline.write("keyA", "v1".to_string()).unwrap();
    pipeline.flush().unwrap();

    assert_eq!(store.writes(), vec![("keyA".to_string(), "v1".to_string())]);
    assert_eq!(store.flush_count(), 1);

    pipeline.flush().unwrap();
    assert_eq!(store.writes().len(), 1);
    assert_eq!(store.flush_count(), 2);
}

/// Verifies that occupancy never exceeds capacity and stays consistent
/// across a mixed read/write workload with evictions.
#[test]
fn test_occupancy_bounded_under_mixed_workload() {
    let store = seeded_store();
    let cache = Arc::new(WriteBackCache::with_capacity(3).unwrap());
    let pipeline = Pipeline::builder()
        .layer_arc(Arc::clone(&cache) as Arc<dyn CacheLayer<i32>>)
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    for round in 0..3 {
        for i in 1..=9 {
            let key = format!("{i:03}");
            if (i + round) % 2 == 0 {
                pipeline.write(&key, i * 10).unwrap();
            } else {
                pipeline.read(&key).unwrap();
            }
            assert!(cache.len() <= 3);
        }
    }

    pipeline.flush().unwrap();
    assert!(cache.len() <= 3);
}

/// Verifies that a multi-stage chain (passthrough in front) behaves
/// identically to the cache alone: the identity stage adds nothing.
#[test]
fn test_passthrough_is_identity_in_chain() {
    let store = seeded_store();
    let pipeline = Pipeline::builder()
        .layer(Passthrough::new())
        .layer(WriteBackCache::with_capacity(3).unwrap())
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    assert_eq!(pipeline.read("005").unwrap(), Some(5));
    assert_eq!(store.read_count("005"), 1);
    assert_eq!(pipeline.read("005").unwrap(), Some(5));
    assert_eq!(store.read_count("005"), 1);
}

/// Verifies that two write-back stages chain cleanly: the front cache
/// absorbs traffic, and flushing drains dirty data level by level into the
/// store.
#[test]
fn test_two_level_cache_chain() {
    let store: Arc<RecordingStore<i32>> = Arc::new(RecordingStore::new());
    let pipeline = Pipeline::builder()
        .layer(WriteBackCache::with_capacity(2).unwrap())
        .layer(WriteBackCache::with_capacity(8).unwrap())
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    pipeline.write("a", 1).unwrap();
    pipeline.write("b", 2).unwrap();
    assert!(store.writes().is_empty());

    // Front flush pushes into the second level; its own flush step then
    // drains that level into the store.
    pipeline.flush().unwrap();
    assert_eq!(store.get_direct("a"), Some(1));
    assert_eq!(store.get_direct("b"), Some(2));
    assert_eq!(store.flush_count(), 1);
}

/// Verifies that store failures bubble through the whole chain unchanged.
#[test]
fn test_store_failure_propagates_through_chain() {
    let pipeline: Pipeline<i32> = Pipeline::builder()
        .layer(Passthrough::new())
        .layer(WriteBackCache::with_capacity(2).unwrap())
        .store(FailingStore::new("backend offline"))
        .build()
        .unwrap();

    let err = pipeline.read("anything").unwrap_err();
    assert!(matches!(err, CacheError::StoreUnavailable(_)));

    // Writes are absorbed fine; the failure surfaces on flush.
    pipeline.write("a", 1).unwrap();
    let err = pipeline.flush().unwrap_err();
    assert!(matches!(err, CacheError::StoreUnavailable(_)));
}

/// Verifies that wiring the same stage into the chain twice is refused at
/// build time as a cycle.
#[test]
fn test_duplicate_stage_rejected_as_cycle() {
    let shared: Arc<dyn CacheLayer<i32>> = Arc::new(Passthrough::new());

    let err = Pipeline::builder()
        .layer_arc(Arc::clone(&shared))
        .layer_arc(shared)
        .store(RecordingStore::new())
        .build()
        .unwrap_err();

    assert!(matches!(err, CacheError::CycleDetected { .. }));
}

/// Verifies metrics through a pipeline: hits, misses and write-backs add up
/// for a small seeded workload.
#[test]
fn test_stats_through_pipeline() {
    let store = seeded_store();
    let cache = Arc::new(
        WriteBackCache::new(WriteBackConfig::builder().capacity(3).track_metrics(true).build())
            .unwrap(),
    );
    let pipeline = Pipeline::builder()
        .layer_arc(Arc::clone(&cache) as Arc<dyn CacheLayer<i32>>)
        .store(Arc::clone(&store))
        .build()
        .unwrap();

    pipeline.read("001").unwrap(); // miss
    pipeline.read("001").unwrap(); // hit
    pipeline.write("002", 20).unwrap(); // dirty insert
    pipeline.flush().unwrap(); // one write-back

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.inserts, 2);
    assert_eq!(stats.write_backs, 1);
    assert_eq!(stats.size, 2);
}
