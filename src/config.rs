//! Worker configuration.
//!
//! All timers live on the config so multiple worker instances can
//! coexist with independent intervals - nothing here is process-global.
//! A JSON file form is accepted for deployment configs; durations are
//! given as integer fields (`*_ms` / `*_secs`).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::relay::DEFAULT_RELAY_CAPACITY;

/// Runtime configuration for one worker instance.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Broker address (`host:port`).
    pub broker_addr: String,
    /// Worker identity name; empty means anonymous.
    pub name: String,
    /// Emit a debug log line for every dispatched request.
    pub log_requests: bool,
    /// How often to send our own heartbeat.
    pub heartbeat_interval: Duration,
    /// Bounded wake-up interval of the poll loop, independent of the
    /// protocol timers.
    pub poll_interval: Duration,
    /// Initial (and post-traffic reset) heartbeat failure threshold.
    pub backoff_floor: Duration,
    /// Ceiling the failure threshold doubles up to.
    pub backoff_ceiling: Duration,
    /// Upper bound on one connect attempt.
    pub connect_timeout: Duration,
    /// Capacity of the outbound relay channel.
    pub relay_capacity: usize,
}

impl WorkerConfig {
    /// Configuration with protocol defaults for the given broker.
    pub fn new(broker_addr: impl Into<String>) -> Self {
        Self {
            broker_addr: broker_addr.into(),
            name: String::new(),
            log_requests: false,
            heartbeat_interval: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(500),
            backoff_floor: Duration::from_secs(4),
            backoff_ceiling: Duration::from_secs(32),
            connect_timeout: Duration::from_secs(5),
            relay_capacity: DEFAULT_RELAY_CAPACITY,
        }
    }

    /// Set the worker identity name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable per-request logging.
    pub fn with_log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Ok(raw.into())
    }
}

/// Serde-facing form with integer duration fields.
#[derive(Debug, Deserialize)]
struct RawConfig {
    broker_addr: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    log_requests: bool,
    #[serde(default = "default_heartbeat_ms")]
    heartbeat_interval_ms: u64,
    #[serde(default = "default_poll_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_backoff_floor_secs")]
    backoff_floor_secs: u64,
    #[serde(default = "default_backoff_ceiling_secs")]
    backoff_ceiling_secs: u64,
    #[serde(default = "default_connect_timeout_ms")]
    connect_timeout_ms: u64,
    #[serde(default = "default_relay_capacity")]
    relay_capacity: usize,
}

fn default_heartbeat_ms() -> u64 {
    1000
}
fn default_poll_ms() -> u64 {
    500
}
fn default_backoff_floor_secs() -> u64 {
    4
}
fn default_backoff_ceiling_secs() -> u64 {
    32
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_relay_capacity() -> usize {
    DEFAULT_RELAY_CAPACITY
}

impl From<RawConfig> for WorkerConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            broker_addr: raw.broker_addr,
            name: raw.name,
            log_requests: raw.log_requests,
            heartbeat_interval: Duration::from_millis(raw.heartbeat_interval_ms),
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            backoff_floor: Duration::from_secs(raw.backoff_floor_secs),
            backoff_ceiling: Duration::from_secs(raw.backoff_ceiling_secs),
            connect_timeout: Duration::from_millis(raw.connect_timeout_ms),
            relay_capacity: raw.relay_capacity,
        }
    }
}
