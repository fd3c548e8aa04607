//! Resilience primitives shared by every service: retry, circuit breaker,
//! cancellable debounce, and log-spam throttling.
//!
//! All timing uses [`tokio::time`] so behaviour can be driven
//! deterministically under a paused test clock.

pub mod circuit_breaker;
pub mod debounce;
pub mod log_throttle;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use debounce::Debouncer;
pub use log_throttle::LogThrottle;
pub use retry::{Backoff, RetryPolicy, retry_with_connection};
