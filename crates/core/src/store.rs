//! The terminal store port and its stage adapter.
//!
//! [`Store`] is the contract any backing store must satisfy: `read`,
//! `write`, `flush`. Adapters needing wire-level bytes perform encode/decode
//! at their own boundary; nothing in the pipeline inspects a value.
//!
//! [`StoreLayer`] mounts a store at the end of a chain: a terminal stage
//! whose operations delegate straight to the store and which refuses any
//! downstream of its own.

use std::sync::Arc;

use crate::error::{CacheError, CacheResult};
use crate::layer::{CacheLayer, CacheValue, LayerId};

/// Contract for a terminal key/value backend.
///
/// `flush` may be a no-op for stores with nothing to sync. Implementations
/// surface their own failures through [`CacheError`]; the pipeline never
/// interprets them beyond propagation.
pub trait Store<V: CacheValue>: Send + Sync {
    /// Look up `key`; `Ok(None)` when the store has no such key.
    fn read(&self, key: &str) -> CacheResult<Option<V>>;

    /// Persist `value` under `key`, replacing any prior value.
    fn write(&self, key: &str, value: V) -> CacheResult<()>;

    /// Apply the store's own durability semantics (e.g. a disk sync).
    fn flush(&self) -> CacheResult<()>;
}

/// A shared handle to a store is itself a store.
///
/// Lets a caller keep a handle to a store that is already mounted in a
/// pipeline, e.g. to seed or inspect it directly in tests.
impl<V, S> Store<V> for Arc<S>
where
    V: CacheValue,
    S: Store<V> + ?Sized,
{
    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        (**self).write(key, value)
    }

    fn flush(&self) -> CacheResult<()> {
        (**self).flush()
    }
}

/// Terminal stage wrapping a [`Store`].
///
/// The store backend is chosen at construction and never reassigned.
/// Connecting a downstream onto a terminal stage is a contract violation and
/// fails with [`CacheError::InvalidLayer`].
#[derive(Debug)]
pub struct StoreLayer<S> {
    id: LayerId,
    store: S,
}

impl<S> StoreLayer<S> {
    /// Wrap `store` as a terminal pipeline stage.
    pub fn new(store: S) -> Self {
        Self { id: LayerId::next(), store }
    }

    /// Access the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<V, S> CacheLayer<V> for StoreLayer<S>
where
    V: CacheValue,
    S: Store<V> + 'static,
{
    fn id(&self) -> LayerId {
        self.id
    }

    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        self.store.read(key)
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        self.store.write(key, value)
    }

    fn flush(&self) -> CacheResult<()> {
        self.store.flush()
    }

    fn connect(&self, _downstream: Arc<dyn CacheLayer<V>>) -> CacheResult<()> {
        Err(CacheError::InvalidLayer(format!(
            "{} is a terminal store stage and cannot take a downstream",
            self.id
        )))
    }

    fn downstream(&self) -> Option<Arc<dyn CacheLayer<V>>> {
        None
    }
}
