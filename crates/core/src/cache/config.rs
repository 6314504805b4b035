//! Write-back cache configuration and builder.

/// Configuration for a [`WriteBackCache`](super::WriteBackCache).
#[derive(Debug, Clone)]
pub struct WriteBackConfig {
    /// Maximum number of cached entries. Must be greater than zero;
    /// validated when the engine is constructed.
    pub capacity: usize,

    /// Whether to collect hit/miss/eviction/write-back counters.
    pub track_metrics: bool,
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self { capacity: 1024, track_metrics: false }
    }
}

impl WriteBackConfig {
    /// Configuration with the given capacity and metrics disabled.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, track_metrics: false }
    }

    /// Create a new configuration builder.
    pub fn builder() -> WriteBackConfigBuilder {
        WriteBackConfigBuilder::default()
    }
}

/// Builder for [`WriteBackConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct WriteBackConfigBuilder {
    config: WriteBackConfig,
}

impl WriteBackConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Enable or disable metrics tracking.
    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WriteBackConfig {
        self.config
    }
}
