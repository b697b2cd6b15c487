//! Configuration for heoslink
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Default HEOS CLI port
pub const DEFAULT_PORT: u16 = 1255;

/// Read timeout used when none (or 0) is configured
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Device host name or IP address
    pub host: String,

    /// Device TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Heartbeat Configuration
    // -------------------------------------------------------------------------
    /// Whether to run the background keep-alive
    pub heartbeat_enabled: bool,

    /// Delay between the end of one keep-alive and the start of the next
    pub heartbeat_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Response read timeout (milliseconds, 0 = default). Reads are always
    /// bounded.
    pub read_timeout_ms: u64,

    /// Command write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Dispatch Configuration
    // -------------------------------------------------------------------------
    /// Worker threads used to run dispatched operations
    pub worker_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            heartbeat_enabled: true,
            heartbeat_interval_ms: 30_000,
            connect_timeout_ms: 5000,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: 5000,
            worker_threads: 4,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string for connecting
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Effective response read timeout, never unbounded
    pub fn read_timeout(&self) -> Duration {
        match self.read_timeout_ms {
            0 => Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    pub(crate) fn timeout(ms: u64) -> Option<Duration> {
        if ms > 0 {
            Some(Duration::from_millis(ms))
        } else {
            None
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the device host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the device port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable the background keep-alive
    pub fn heartbeat_enabled(mut self, enabled: bool) -> Self {
        self.config.heartbeat_enabled = enabled;
        self
    }

    /// Set the keep-alive interval (in milliseconds)
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_interval_ms = ms;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds, 0 restores the default)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = if ms == 0 { DEFAULT_READ_TIMEOUT_MS } else { ms };
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the number of dispatch worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
