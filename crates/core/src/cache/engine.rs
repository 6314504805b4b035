//! The write-back cache engine.
//!
//! State is an entries map plus a FIFO order deque behind one mutex:
//! eviction is a check-then-act sequence (check capacity, mutate map and
//! order, possibly call downstream) that must be atomic per stage. The lock
//! is held across downstream calls; the reference semantics are fully
//! blocking and eager cycle detection in `connect` keeps the hold-across-call
//! free of lock cycles.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::config::WriteBackConfig;
use super::stats::{CacheStats, MetricsCollector};
use crate::error::{CacheError, CacheResult};
use crate::layer::{CacheLayer, CacheValue, DownstreamLink, LayerId};

/// A cached value plus its persistence state.
///
/// `dirty` means the value was set by a `write` and has not yet been
/// persisted downstream; a clean entry is known to equal the last observed
/// downstream copy.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    dirty: bool,
}

/// Entries map and eviction order, guarded together.
///
/// Invariant: the same keys appear in `entries` and `order`, each exactly
/// once, and `entries.len() <= capacity` at all times.
#[derive(Debug)]
struct EngineState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
}

impl<V> EngineState<V> {
    fn new() -> Self {
        Self { entries: HashMap::new(), order: VecDeque::new() }
    }
}

/// Bounded write-back cache stage with FIFO eviction.
///
/// Writes are absorbed into the cache and deferred to the backing store
/// until eviction or flush. Reads populate the cache from downstream on a
/// miss; hits never call downstream and never reorder the eviction queue
/// (FIFO is insertion-order only).
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use cachepipe_core::{CacheLayer, StoreLayer, WriteBackCache};
/// use cachepipe_core::testing::RecordingStore;
///
/// let store = Arc::new(RecordingStore::seeded([("k", 10)]));
/// let cache = WriteBackCache::with_capacity(3)?;
/// cache.connect(Arc::new(StoreLayer::new(Arc::clone(&store))))?;
///
/// assert_eq!(cache.read("k")?, Some(10));
/// cache.write("k", 11)?; // store still holds 10 until eviction or flush
/// assert_eq!(store.get_direct("k"), Some(10));
/// # Ok::<(), cachepipe_core::CacheError>(())
/// ```
#[derive(Debug)]
pub struct WriteBackCache<V: CacheValue> {
    id: LayerId,
    config: WriteBackConfig,
    state: Mutex<EngineState<V>>,
    link: DownstreamLink<V>,
    metrics: MetricsCollector,
}

impl<V: CacheValue> WriteBackCache<V> {
    /// Create an engine from a configuration.
    ///
    /// Fails with [`CacheError::InvalidConfig`] if `capacity` is zero: a
    /// zero-capacity cache could never satisfy its own insertion step.
    pub fn new(config: WriteBackConfig) -> CacheResult<Self> {
        if config.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "write-back cache capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            id: LayerId::next(),
            config,
            state: Mutex::new(EngineState::new()),
            link: DownstreamLink::new(),
            metrics: MetricsCollector::new(),
        })
    }

    /// Engine with the given capacity and metrics disabled.
    pub fn with_capacity(capacity: usize) -> CacheResult<Self> {
        Self::new(WriteBackConfig::new(capacity))
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Snapshot of the engine's counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len(), self.config.capacity)
    }

    /// Evict the oldest entry to make room for an insertion.
    ///
    /// A dirty victim is written downstream BEFORE anything is removed; if
    /// that write fails, the error propagates and the victim stays cached,
    /// so a failed eviction never loses data. Only after a successful
    /// write-back (or for a clean victim, immediately) is the key dropped
    /// from both the map and the order queue.
    fn evict_oldest(&self, state: &mut EngineState<V>) -> CacheResult<()> {
        let Some(victim) = state.order.front().cloned() else {
            return Ok(());
        };

        let pending = state.entries.get(&victim).filter(|e| e.dirty).map(|e| e.value.clone());
        if let Some(value) = pending {
            debug!(key = %victim, "evicting dirty entry, writing back");
            self.link.write(&victim, value)?;
            if self.config.track_metrics {
                self.metrics.record_write_back();
            }
        } else {
            debug!(key = %victim, "evicting clean entry");
        }

        state.order.pop_front();
        state.entries.remove(&victim);
        if self.config.track_metrics {
            self.metrics.record_eviction();
        }
        Ok(())
    }
}

impl<V: CacheValue> CacheLayer<V> for WriteBackCache<V> {
    fn id(&self) -> LayerId {
        self.id
    }

    /// Serve `key` from the cache, populating it from downstream on a miss.
    ///
    /// A hit never calls downstream and never promotes the key. A miss
    /// first makes room (evicting the oldest entry if at capacity), then
    /// fetches; an absent downstream value propagates as `Ok(None)` and is
    /// not cached.
    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get(key) {
            trace!(key, "cache hit");
            if self.config.track_metrics {
                self.metrics.record_hit();
            }
            return Ok(Some(entry.value.clone()));
        }

        debug!(key, "cache miss");
        if self.config.track_metrics {
            self.metrics.record_miss();
        }

        if state.entries.len() >= self.config.capacity {
            self.evict_oldest(&mut state)?;
        }

        let Some(value) = self.link.read(key)? else {
            return Ok(None);
        };

        state.order.push_back(key.to_string());
        state.entries.insert(key.to_string(), CacheEntry { value: value.clone(), dirty: false });
        if self.config.track_metrics {
            self.metrics.record_insert();
        }

        Ok(Some(value))
    }

    /// Absorb `value` into the cache as a dirty entry.
    ///
    /// No downstream call is made; persistence is deferred to eviction or
    /// flush. Overwriting an existing entry marks it dirty even if it was
    /// previously clean.
    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        let mut state = self.state.lock();

        if !state.entries.contains_key(key) {
            if state.entries.len() >= self.config.capacity {
                self.evict_oldest(&mut state)?;
            }
            state.order.push_back(key.to_string());
        }

        trace!(key, "write absorbed");
        state.entries.insert(key.to_string(), CacheEntry { value, dirty: true });
        if self.config.track_metrics {
            self.metrics.record_insert();
        }

        Ok(())
    }

    /// Persist every dirty entry downstream, then propagate the flush.
    ///
    /// The sequence is fixed: write each dirty entry through (in insertion
    /// order), clear its dirty flag on success, and finally forward `flush`
    /// downstream unconditionally. Clearing the flag makes a repeated flush
    /// with no intervening writes perform zero downstream writes.
    fn flush(&self) -> CacheResult<()> {
        let mut state = self.state.lock();

        let keys: Vec<String> = state.order.iter().cloned().collect();
        for key in keys {
            let Some(value) = state.entries.get(&key).filter(|e| e.dirty).map(|e| e.value.clone())
            else {
                continue;
            };

            debug!(key = %key, "flushing dirty entry");
            self.link.write(&key, value)?;
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.dirty = false;
            }
            if self.config.track_metrics {
                self.metrics.record_write_back();
            }
        }

        self.link.flush()
    }

    fn connect(&self, downstream: Arc<dyn CacheLayer<V>>) -> CacheResult<()> {
        self.link.bind(self.id, downstream)
    }

    fn downstream(&self) -> Option<Arc<dyn CacheLayer<V>>> {
        self.link.get()
    }
}
