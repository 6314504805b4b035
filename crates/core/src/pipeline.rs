//! Pipeline construction and the front-stage handle.
//!
//! A pipeline is an ordered chain of stages, each bound to the next through
//! its single downstream link. The builder collects stages front-to-back and
//! wires them on `build`, surfacing any `connect` contract violation at
//! construction time instead of on the first call.

use std::fmt;
use std::sync::Arc;

use crate::error::{CacheError, CacheResult};
use crate::layer::{CacheLayer, CacheValue};
use crate::store::{Store, StoreLayer};

/// An assembled chain of cache stages.
///
/// Operations enter at the front stage and flow down the chain; results flow
/// back unchanged. The pipeline owns its stages; dropping it drops every
/// stage that is not otherwise shared.
///
/// # Example
/// ```
/// use cachepipe_core::{Passthrough, Pipeline, WriteBackCache};
/// use cachepipe_core::testing::RecordingStore;
///
/// let pipeline = Pipeline::builder()
///     .layer(Passthrough::new())
///     .layer(WriteBackCache::with_capacity(64)?)
///     .store(RecordingStore::seeded([("k", "v".to_string())]))
///     .build()?;
///
/// assert_eq!(pipeline.read("k")?.as_deref(), Some("v"));
/// # Ok::<(), cachepipe_core::CacheError>(())
/// ```
pub struct Pipeline<V: CacheValue> {
    front: Arc<dyn CacheLayer<V>>,
    stages: Vec<Arc<dyn CacheLayer<V>>>,
}

impl<V: CacheValue> Pipeline<V> {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder<V> {
        PipelineBuilder::new()
    }

    /// Read through the chain from the front stage.
    pub fn read(&self, key: &str) -> CacheResult<Option<V>> {
        self.front.read(key)
    }

    /// Write into the chain from the front stage.
    pub fn write(&self, key: &str, value: V) -> CacheResult<()> {
        self.front.write(key, value)
    }

    /// Flush the chain from the front stage.
    pub fn flush(&self) -> CacheResult<()> {
        self.front.flush()
    }

    /// The stage requests enter at.
    pub fn front(&self) -> &Arc<dyn CacheLayer<V>> {
        &self.front
    }

    /// All stages, front first.
    pub fn stages(&self) -> &[Arc<dyn CacheLayer<V>>] {
        &self.stages
    }
}

impl<V: CacheValue> fmt::Debug for Pipeline<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = self.stages.iter().map(|stage| stage.id()).collect();
        f.debug_struct("Pipeline")
            .field("front", &self.front.id())
            .field("stages", &ids)
            .finish()
    }
}

/// Builder collecting stages front-to-back.
pub struct PipelineBuilder<V: CacheValue> {
    stages: Vec<Arc<dyn CacheLayer<V>>>,
}

impl<V: CacheValue> PipelineBuilder<V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the back of the chain.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: CacheLayer<V> + 'static,
    {
        self.stages.push(Arc::new(layer));
        self
    }

    /// Append an already-shared stage to the back of the chain.
    pub fn layer_arc(mut self, layer: Arc<dyn CacheLayer<V>>) -> Self {
        self.stages.push(layer);
        self
    }

    /// Append a terminal stage wrapping `store`.
    ///
    /// Convenience for `layer(StoreLayer::new(store))`; the store ends the
    /// chain, so this is normally the last call before `build`.
    pub fn store<S>(self, store: S) -> Self
    where
        S: Store<V> + 'static,
    {
        self.layer(StoreLayer::new(store))
    }

    /// Wire the collected stages and return the pipeline.
    ///
    /// Fails with [`CacheError::InvalidLayer`] on an empty chain, and
    /// propagates `connect` failures (a terminal stage placed mid-chain, a
    /// stage appearing twice and closing a cycle).
    pub fn build(self) -> CacheResult<Pipeline<V>> {
        let Some(front) = self.stages.first().cloned() else {
            return Err(CacheError::InvalidLayer(
                "a pipeline needs at least one stage".to_string(),
            ));
        };

        for (upstream, downstream) in self.stages.iter().zip(self.stages.iter().skip(1)) {
            upstream.connect(Arc::clone(downstream))?;
        }

        Ok(Pipeline { front, stages: self.stages })
    }
}

impl<V: CacheValue> Default for PipelineBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for pipeline.
    use std::sync::Arc;

    use super::*;
    use crate::cache::WriteBackCache;
    use crate::passthrough::Passthrough;
    use crate::testing::RecordingStore;

    /// Validates `PipelineBuilder::build` behavior for the empty pipeline
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures building an empty chain fails with `InvalidLayer`.
    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::<i32>::new().build().unwrap_err();
        assert!(matches!(err, CacheError::InvalidLayer(_)));
    }

    /// Validates `PipelineBuilder::build` behavior for the mid-chain
    /// terminal scenario.
    ///
    /// Assertions:
    /// - Ensures a store stage placed before another stage fails the build.
    #[test]
    fn test_terminal_mid_chain_rejected() {
        let err = Pipeline::builder()
            .store(RecordingStore::<i32>::new())
            .layer(Passthrough::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidLayer(_)));
    }

    /// Validates `PipelineBuilder::build` behavior for the wiring scenario.
    ///
    /// Assertions:
    /// - Confirms each stage is connected to its successor, front first.
    #[test]
    fn test_stages_wired_front_to_back() {
        let pipeline = Pipeline::builder()
            .layer(Passthrough::<i32>::new())
            .layer(Passthrough::new())
            .store(RecordingStore::new())
            .build()
            .unwrap();

        let stages = pipeline.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].downstream().map(|s| s.id()), Some(stages[1].id()));
        assert_eq!(stages[1].downstream().map(|s| s.id()), Some(stages[2].id()));
        assert!(stages[2].downstream().is_none());
        assert_eq!(pipeline.front().id(), stages[0].id());
    }

    /// Validates `Pipeline::read` behavior for the end-to-end flow
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a read traverses passthrough and cache down to the store.
    /// - Confirms a write is absorbed by the cache stage, not the store.
    /// - Confirms flush pushes the dirty entry into the store.
    #[test]
    fn test_pipeline_end_to_end() {
        let store = Arc::new(RecordingStore::seeded([("k", 5)]));
        let pipeline = Pipeline::builder()
            .layer(Passthrough::new())
            .layer(WriteBackCache::with_capacity(4).unwrap())
            .store(Arc::clone(&store))
            .build()
            .unwrap();

        assert_eq!(pipeline.read("k").unwrap(), Some(5));

        pipeline.write("fresh", 9).unwrap();
        assert_eq!(store.get_direct("fresh"), None);

        pipeline.flush().unwrap();
        assert_eq!(store.get_direct("fresh"), Some(9));
        assert_eq!(store.flush_count(), 1);
    }

    /// Validates `PipelineBuilder::layer_arc` behavior for the shared stage
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a caller-held stage handle observes pipeline traffic.
    #[test]
    fn test_shared_stage_handle() {
        let cache = Arc::new(WriteBackCache::with_capacity(4).unwrap());
        let pipeline = Pipeline::builder()
            .layer_arc(Arc::clone(&cache) as Arc<dyn CacheLayer<i32>>)
            .store(RecordingStore::new())
            .build()
            .unwrap();

        pipeline.write("a", 1).unwrap();
        assert_eq!(cache.len(), 1);
    }
}
