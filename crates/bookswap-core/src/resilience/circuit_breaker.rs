//! Failure-counting circuit breaker with a lazy cooldown reset.
//!
//! ```text
//!            failures >= threshold
//!   CLOSED ─────────────────────────► OPEN
//!     ▲                                │
//!     └────────────────────────────────┘
//!        next call after cooldown elapsed
//! ```
//!
//! There is no half-open probe state: once the cooldown since the last
//! failure has elapsed, the next call finds the breaker closed again.
//! The breaker is a liveness guard against request and log spam, so
//! callers must tolerate a suppressed call returning nothing.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::result::AppResult;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests pass through.
    Closed,
    /// Requests short-circuit.
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time since the last failure after which the circuit closes.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(5 * 60),
        }
    }
}

/// Point-in-time view of a breaker, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures recorded.
    pub failure_count: u32,
}

#[derive(Debug)]
struct BreakerInner {
    is_open: bool,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// A circuit breaker guarding one dependency.
///
/// Instances are shared by `Arc` with every caller of the guarded
/// dependency, so tests can build isolated breakers.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Name used in log output.
    name: String,
    /// Thresholds.
    config: CircuitBreakerConfig,
    /// Mutable state; never held across an await point.
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                is_open: false,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    /// Name of the guarded dependency.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a call may proceed right now.
    ///
    /// An open breaker whose cooldown has elapsed is closed as a side effect.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        if !inner.is_open {
            return true;
        }

        let cooled_down = inner
            .last_failure
            .map(|at| at.elapsed() > self.config.cooldown)
            .unwrap_or(true);

        if cooled_down {
            inner.is_open = false;
            inner.failure_count = 0;
            info!(breaker = %self.name, "Circuit breaker cooldown elapsed, closing");
            true
        } else {
            false
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.failure_count > 0 {
            inner.failure_count = 0;
        }
    }

    /// Record a failed call, opening the circuit at the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        if !inner.is_open && inner.failure_count >= self.config.failure_threshold {
            inner.is_open = true;
            warn!(
                breaker = %self.name,
                failures = inner.failure_count,
                cooldown_secs = self.config.cooldown.as_secs(),
                "Circuit breaker opened"
            );
        }
    }

    /// Run `op` through the breaker.
    ///
    /// Returns `Ok(None)` without invoking `op` while the circuit is open,
    /// `Ok(Some(value))` on success and the error on failure. Failures are
    /// counted; successes reset the count.
    pub async fn call<T, F, Fut>(&self, op: F) -> AppResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if !self.allow_request() {
            return Ok(None);
        }

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(Some(value))
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    /// Current state without triggering the lazy reset.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: if inner.is_open {
                CircuitState::Open
            } else {
                CircuitState::Closed
            },
            failure_count: inner.failure_count,
        }
    }

    /// Force the breaker closed.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.is_open = false;
        inner.failure_count = 0;
        inner.last_failure = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
