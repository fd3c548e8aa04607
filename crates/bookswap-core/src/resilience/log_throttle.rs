//! Per-source suppression of repeated error logs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct SourceWindow {
    started: Instant,
    logged: u32,
    suppressed: u64,
}

/// Allows at most `max_logs` log lines per source within each `window`.
///
/// Only the logging is throttled; the operations being logged keep running.
#[derive(Debug)]
pub struct LogThrottle {
    /// Log lines allowed per window.
    max_logs: u32,
    /// Window length.
    window: Duration,
    /// Per-source counters.
    sources: Mutex<HashMap<String, SourceWindow>>,
}

impl LogThrottle {
    /// Create a throttle.
    pub fn new(max_logs: u32, window: Duration) -> Self {
        Self {
            max_logs,
            window,
            sources: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a log line for `source` should be emitted now.
    pub fn should_log(&self, source: &str) -> bool {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let entry = sources.entry(source.to_string()).or_insert(SourceWindow {
            started: now,
            logged: 0,
            suppressed: 0,
        });

        if now.duration_since(entry.started) > self.window {
            if entry.suppressed > 0 {
                debug!(
                    source,
                    suppressed = entry.suppressed,
                    "Log throttle window reset"
                );
            }
            entry.started = now;
            entry.logged = 0;
            entry.suppressed = 0;
        }

        if entry.logged < self.max_logs {
            entry.logged += 1;
            true
        } else {
            entry.suppressed += 1;
            false
        }
    }

    /// Number of suppressed lines for `source` in the current window.
    pub fn suppressed(&self, source: &str) -> u64 {
        self.sources
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
            .map(|w| w.suppressed)
            .unwrap_or(0)
    }

    /// Forget the counters for `source`.
    pub fn reset(&self, source: &str) {
        self.sources
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(source);
    }
}
