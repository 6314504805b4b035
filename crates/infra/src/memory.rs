//! In-memory store backend.

use std::collections::HashMap;

use cachepipe_core::{CacheResult, CacheValue, Store};
use parking_lot::RwLock;
use tracing::trace;

/// A key/value store held entirely in memory.
///
/// Useful as a terminal backend for demos and tests, and as the reference
/// implementation of the store contract. Values are stored as-is; no
/// encoding happens at this boundary. `flush` is a no-op — there is nothing
/// more durable to sync to.
#[derive(Debug, Default)]
pub struct MemoryStore<V> {
    data: RwLock<HashMap<String, V>>,
}

impl<V: CacheValue> MemoryStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { data: RwLock::new(HashMap::new()) }
    }

    /// Create a store pre-populated with `entries`.
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

    /// Set a value directly, bypassing any pipeline mounted on top.
    pub fn set_direct(&self, key: impl Into<String>, value: V) {
        self.data.write().insert(key.into(), value);
    }

    /// Inspect a value directly, bypassing any pipeline mounted on top.
    pub fn get_direct(&self, key: &str) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl<V: CacheValue> Store<V> for MemoryStore<V> {
    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        trace!(key, "memory store read");
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        trace!(key, "memory store write");
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        trace!("memory store flush (no-op)");
        Ok(())
    }
}
