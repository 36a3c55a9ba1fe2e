//! Session configuration.

use std::time::Duration;

use crate::core::{ConfigError, ProtocolVersion, DEFAULT_QUEUE_CAPACITY};
use crate::sync::TimerConfig;

/// Client session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Protocol version to start with. May be downgraded once per session.
    pub version: ProtocolVersion,

    /// Refresh, retry and expire intervals.
    pub timers: TimerConfig,

    /// Capacity of the outbound PDU queue.
    pub queue_capacity: usize,

    /// Replace `timers` with the intervals a version 1 cache advertises in
    /// End of Data.
    pub adopt_cache_intervals: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::default(),
            timers: TimerConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            adopt_cache_intervals: true,
        }
    }
}

impl ClientConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Check the configuration for values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timers.validate()?;
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial protocol version.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.config.version = version;
        self
    }

    /// Set the refresh interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.timers.refresh = interval;
        self
    }

    /// Set the retry interval.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.timers.retry = interval;
        self
    }

    /// Set the expire interval.
    pub fn expire_interval(mut self, interval: Duration) -> Self {
        self.config.timers.expire = interval;
        self
    }

    /// Set all three intervals at once.
    pub fn timers(mut self, timers: TimerConfig) -> Self {
        self.config.timers = timers;
        self
    }

    /// Set the outbound queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Enable or disable adopting cache-advertised intervals.
    pub fn adopt_cache_intervals(mut self, adopt: bool) -> Self {
        self.config.adopt_cache_intervals = adopt;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
