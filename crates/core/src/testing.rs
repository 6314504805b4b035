//! Test doubles for exercising pipelines without a real backend.
//!
//! [`RecordingStore`] is a seeded in-memory store that logs every `read`,
//! `write` and `flush` it receives, so tests can assert exactly which calls
//! crossed the cache boundary. [`FailingStore`] fails every operation, for
//! error-propagation tests. Both are used by this crate's own unit,
//! integration and bench code and are exported for downstream crates' tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{CacheError, CacheResult};
use crate::layer::CacheValue;
use crate::store::Store;

/// In-memory store that records every downstream call it receives.
#[derive(Debug, Default)]
pub struct RecordingStore<V> {
    data: RwLock<HashMap<String, V>>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, V)>>,
    flushes: AtomicUsize,
}

impl<V: CacheValue> RecordingStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            flushes: AtomicUsize::new(0),
        }
    }

    /// Create a store pre-populated with `entries`. Seeding is not
    /// recorded.
    pub fn seeded<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let store = Self::new();
        {
            let mut data = store.data.write();
            for (key, value) in entries {
                data.insert(key.into(), value);
            }
        }
        store
    }

    /// Set a value directly, bypassing the pipeline and the call log.
    ///
    /// Models an out-of-band change to the backing store, e.g. another
    /// client writing behind the cache's back.
    pub fn set_direct(&self, key: impl Into<String>, value: V) {
        self.data.write().insert(key.into(), value);
    }

    /// Inspect a value directly, bypassing the pipeline and the call log.
    pub fn get_direct(&self, key: &str) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// Every key read through the store contract, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }

    /// Every write received through the store contract, in call order.
    pub fn writes(&self) -> Vec<(String, V)> {
        self.writes.lock().clone()
    }

    /// Number of contract reads for `key`.
    pub fn read_count(&self, key: &str) -> usize {
        self.reads.lock().iter().filter(|k| *k == key).count()
    }

    /// Number of contract writes for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes.lock().iter().filter(|(k, _)| k == key).count()
    }

    /// Number of flushes received.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Forget all recorded calls (data is kept).
    pub fn clear_recording(&self) {
        self.reads.lock().clear();
        self.writes.lock().clear();
        self.flushes.store(0, Ordering::Relaxed);
    }
}

impl<V: CacheValue> Store<V> for RecordingStore<V> {
    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        self.reads.lock().push(key.to_string());
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        self.writes.lock().push((key.to_string(), value.clone()));
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Store that fails every operation with [`CacheError::StoreUnavailable`].
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Create a store failing with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl<V: CacheValue> Store<V> for FailingStore {
    fn read(&self, _key: &str) -> CacheResult<Option<V>> {
        Err(CacheError::StoreUnavailable(self.message.clone()))
    }

    fn write(&self, _key: &str, _value: V) -> CacheResult<()> {
        Err(CacheError::StoreUnavailable(self.message.clone()))
    }

    fn flush(&self) -> CacheResult<()> {
        Err(CacheError::StoreUnavailable(self.message.clone()))
    }
}
