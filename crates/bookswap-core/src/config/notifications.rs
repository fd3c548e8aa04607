//! Notification synchronisation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the notification store accessor and the real-time synchroniser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Quiet period collapsing bursts of change events into one refresh.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    /// Delay table for fetch retries, indexed by attempt and clamped to the last entry.
    #[serde(default = "default_retry_delays")]
    pub retry_delays_ms: Vec<u64>,
    /// Number of scheduled retries after a failed fetch.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Immediate reconnect attempts for a single fetch before it counts as failed.
    #[serde(default = "default_connection_retries")]
    pub connection_retries: u32,
    /// Fixed delay between immediate reconnect attempts.
    #[serde(default = "default_connection_retry_delay")]
    pub connection_retry_delay_ms: u64,
    /// TTL of the per-user read-through notification cache.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Buffer size of the in-process change event bus.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Notifications older than this many days are removed by `cleanup`.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_after_days: u32,
}

impl NotificationConfig {
    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Retry delay table as [`Duration`]s.
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
            retry_delays_ms: default_retry_delays(),
            max_retries: default_max_retries(),
            connection_retries: default_connection_retries(),
            connection_retry_delay_ms: default_connection_retry_delay(),
            cache_ttl_seconds: default_cache_ttl(),
            channel_buffer_size: default_channel_buffer(),
            cleanup_after_days: default_cleanup_days(),
        }
    }
}

fn default_debounce() -> u64 {
    2000
}

fn default_retry_delays() -> Vec<u64> {
    vec![5000, 15000, 30000]
}

fn default_max_retries() -> u32 {
    3
}

fn default_connection_retries() -> u32 {
    0
}

fn default_connection_retry_delay() -> u64 {
    1000
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_channel_buffer() -> usize {
    256
}

fn default_cleanup_days() -> u32 {
    90
}
