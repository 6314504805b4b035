//! The stage contract and chaining machinery.
//!
//! Every pipeline stage implements [`CacheLayer`]: the four operations
//! (`read`, `write`, `flush`, `connect`) plus the chain introspection needed
//! for eager cycle detection (`downstream`, `id`). A stage's concrete
//! behavior is chosen once at construction and never reassigned; the chain is
//! composed by binding each stage's single [`DownstreamLink`] to the next
//! stage.
//!
//! Requests flow caller → stage₁ → stage₂ → … → store; results flow back
//! unchanged. Absence is a value: `read` returns `Ok(None)` all the way up,
//! never an error.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CacheError, CacheResult};

/// Marker for payload types the pipeline can carry.
///
/// The cache never inspects values; it only stores, clones and forwards
/// them. Blanket-implemented for every eligible type.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}

/// Process-unique identity of a pipeline stage.
///
/// Used by [`DownstreamLink::bind`] to refuse links that would close a loop
/// in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

impl LayerId {
    /// Mint a fresh identity. Called once per stage at construction.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// The contract every pipeline stage implements.
///
/// Object-safe so heterogeneous stages can be chained through
/// `Arc<dyn CacheLayer<V>>`. Implementations must be internally synchronized;
/// all operations take `&self`.
pub trait CacheLayer<V: CacheValue>: Send + Sync {
    /// Stage identity, stable for the stage's lifetime.
    fn id(&self) -> LayerId;

    /// Look up `key`. `Ok(None)` means the key is absent all the way down
    /// the chain and is a normal outcome, not an error.
    fn read(&self, key: &str) -> CacheResult<Option<V>>;

    /// Record `value` under `key`. Whether the call reaches the terminal
    /// store immediately is up to the stage's behavior.
    fn write(&self, key: &str, value: V) -> CacheResult<()>;

    /// Force pending state downstream, then propagate the flush along the
    /// chain.
    fn flush(&self) -> CacheResult<()>;

    /// Bind the single next stage. Rebinding overwrites the previous link
    /// (last write wins). Fails with [`CacheError::CycleDetected`] if the
    /// link would make the chain cyclic, or [`CacheError::InvalidLayer`] for
    /// stages that cannot take a downstream at all.
    fn connect(&self, downstream: Arc<dyn CacheLayer<V>>) -> CacheResult<()>;

    /// The currently bound next stage, if any.
    fn downstream(&self) -> Option<Arc<dyn CacheLayer<V>>>;
}

/// A stage's single owned reference to its next stage.
///
/// Encapsulates the forwarding rules shared by all non-terminal stages:
/// without a downstream, `read` resolves to absent, `write` and `flush` are
/// accepted no-ops. The link owns the reference, not the downstream stage's
/// lifetime.
pub struct DownstreamLink<V: CacheValue> {
    slot: RwLock<Option<Arc<dyn CacheLayer<V>>>>,
}

impl<V: CacheValue> DownstreamLink<V> {
    /// Create an unbound link.
    pub fn new() -> Self {
        Self { slot: RwLock::new(None) }
    }

    /// Bind `downstream` on behalf of the stage identified by `owner`.
    ///
    /// Walks the prospective chain by stage identity before committing the
    /// bind; a chain that would contain `owner` twice (or that is already
    /// cyclic further down) is refused. A cyclic chain would loop forever on
    /// the first `read`/`write`/`flush`, so the check is done here, once,
    /// rather than on every call.
    pub fn bind(&self, owner: LayerId, downstream: Arc<dyn CacheLayer<V>>) -> CacheResult<()> {
        let mut seen: Vec<LayerId> = Vec::new();
        let mut cursor = Some(Arc::clone(&downstream));
        while let Some(stage) = cursor {
            let id = stage.id();
            if id == owner || seen.contains(&id) {
                return Err(CacheError::CycleDetected { id });
            }
            seen.push(id);
            cursor = stage.downstream();
        }

        debug!(%owner, downstream = %downstream.id(), "binding downstream link");
        *self.slot.write() = Some(downstream);
        Ok(())
    }

    /// The bound next stage, if any.
    pub fn get(&self) -> Option<Arc<dyn CacheLayer<V>>> {
        self.slot.read().clone()
    }

    /// Forward a read, resolving to absent when unbound.
    pub fn read(&self, key: &str) -> CacheResult<Option<V>> {
        match self.get() {
            Some(next) => next.read(key),
            None => Ok(None),
        }
    }

    /// Forward a write; an unbound link accepts and discards it.
    pub fn write(&self, key: &str, value: V) -> CacheResult<()> {
        match self.get() {
            Some(next) => next.write(key, value),
            None => Ok(()),
        }
    }

    /// Forward a flush; a no-op when unbound.
    pub fn flush(&self) -> CacheResult<()> {
        match self.get() {
            Some(next) => next.flush(),
            None => Ok(()),
        }
    }
}

impl<V: CacheValue> Default for DownstreamLink<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CacheValue> fmt::Debug for DownstreamLink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = self.slot.read().as_ref().map(|next| next.id());
        f.debug_struct("DownstreamLink").field("downstream", &bound).finish()
    }
}
