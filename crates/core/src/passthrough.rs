//! The identity stage: forwards every call unchanged.

use std::sync::Arc;

use tracing::trace;

use crate::error::CacheResult;
use crate::layer::{CacheLayer, CacheValue, DownstreamLink, LayerId};

/// A stage that forwards every call unchanged to the next stage.
///
/// The identity element of the chain: inserting it anywhere changes nothing
/// about what the caller observes. Without a downstream, reads resolve to
/// absent and writes/flushes are accepted no-ops.
#[derive(Debug)]
pub struct Passthrough<V: CacheValue> {
    id: LayerId,
    link: DownstreamLink<V>,
}

impl<V: CacheValue> Passthrough<V> {
    /// Create an unconnected passthrough stage.
    pub fn new() -> Self {
        Self { id: LayerId::next(), link: DownstreamLink::new() }
    }
}

impl<V: CacheValue> Default for Passthrough<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CacheValue> CacheLayer<V> for Passthrough<V> {
    fn id(&self) -> LayerId {
        self.id
    }

    fn read(&self, key: &str) -> CacheResult<Option<V>> {
        trace!(key, "passthrough read");
        self.link.read(key)
    }

    fn write(&self, key: &str, value: V) -> CacheResult<()> {
        trace!(key, "passthrough write");
        self.link.write(key, value)
    }

    fn flush(&self) -> CacheResult<()> {
        trace!("passthrough flush");
        self.link.flush()
    }

    fn connect(&self, downstream: Arc<dyn CacheLayer<V>>) -> CacheResult<()> {
        self.link.bind(self.id, downstream)
    }

    fn downstream(&self) -> Option<Arc<dyn CacheLayer<V>>> {
        self.link.get()
    }
}
