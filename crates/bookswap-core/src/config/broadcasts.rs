//! Broadcast service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::CircuitBreakerConfig;

/// Circuit breaker and log throttling settings for the broadcast service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds after the last failure before the circuit closes again.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Error logs allowed per source within one throttle window.
    #[serde(default = "default_max_logged_errors")]
    pub max_logged_errors: u32,
    /// Length of the log throttle window in seconds.
    #[serde(default = "default_log_window")]
    pub log_window_seconds: u64,
}

impl BroadcastConfig {
    /// Circuit cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Breaker thresholds for the broadcasts table.
    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown: self.cooldown(),
        }
    }

    /// Log throttle window as a [`Duration`].
    pub fn log_window(&self) -> Duration {
        Duration::from_secs(self.log_window_seconds)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_seconds: default_cooldown(),
            max_logged_errors: default_max_logged_errors(),
            log_window_seconds: default_log_window(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown() -> u64 {
    300
}

fn default_max_logged_errors() -> u32 {
    3
}

fn default_log_window() -> u64 {
    300
}
