//! Worker pool configuration

use std::time::Duration;

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker loops
    pub workers: usize,

    /// Delay after a job is fully resolved, to avoid hammering the
    /// generation service
    pub processing_delay: Duration,

    /// Hard wall-clock timeout for a single generation call
    pub generation_timeout: Duration,

    /// Sleep between polls while the queue is empty
    pub poll_interval: Duration,

    /// Retry ceiling for transient generation failures
    pub max_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            processing_delay: Duration::from_millis(1000),
            generation_timeout: Duration::from_millis(60_000),
            poll_interval: Duration::from_millis(2000),
            max_retries: 3,
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Read configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// Recognized variables: `CONCURRENT_WORKERS`, `PROCESSING_DELAY`,
    /// `GENERATION_TIMEOUT`, `POLL_INTERVAL` (milliseconds), `MAX_RETRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            workers: env_parse("CONCURRENT_WORKERS").unwrap_or(defaults.workers),
            processing_delay: env_millis("PROCESSING_DELAY").unwrap_or(defaults.processing_delay),
            generation_timeout: env_millis("GENERATION_TIMEOUT")
                .unwrap_or(defaults.generation_timeout),
            poll_interval: env_millis("POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            max_retries: env_parse("MAX_RETRIES").unwrap_or(defaults.max_retries),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

/// Builder for WorkerConfig
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set inter-job processing delay
    pub fn processing_delay(mut self, duration: Duration) -> Self {
        self.config.processing_delay = duration;
        self
    }

    /// Set generation timeout
    pub fn generation_timeout(mut self, duration: Duration) -> Self {
        self.config.generation_timeout = duration;
        self
    }

    /// Set queue poll interval
    pub fn poll_interval(mut self, duration: Duration) -> Self {
        self.config.poll_interval = duration;
        self
    }

    /// Set retry ceiling
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}

impl Default for WorkerConfigBuilder {
    fn default() -> Self {
        Self {
            config: WorkerConfig::default(),
        }
    }
}
