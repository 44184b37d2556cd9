//! Sliding-window request limiter.
//!
//! At any instant the trailing 60 seconds hold at most
//! `max_requests_per_minute` grants, and consecutive grants are at least
//! `min_interval` apart. Waiting callers sleep and re-check; a grant is
//! recorded under the lock, so concurrent callers cannot overshoot.

use std::collections::VecDeque;
use std::time::Duration;

use sheetsync_store::RateLimitConfig;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Length of the sliding window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Granted request instants.
#[derive(Debug, Default)]
struct RateWindow {
    grants: VecDeque<Instant>,
    last_request: Option<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.grants.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.grants.pop_front();
            } else {
                break;
            }
        }
    }

    fn record(&mut self, now: Instant) {
        self.grants.push_back(now);
        self.last_request = Some(now);
    }
}

/// Limits outgoing requests to a per-minute quota with minimum spacing.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<RateWindow>,
    max_requests: usize,
    min_interval: Duration,
    safety_buffer: Duration,
}

impl RateLimiter {
    /// Creates a limiter.
    ///
    /// A `max_requests` of zero is treated as one.
    pub fn new(max_requests: usize, min_interval: Duration, safety_buffer: Duration) -> Self {
        Self {
            window: Mutex::new(RateWindow::default()),
            max_requests: max_requests.max(1),
            min_interval,
            safety_buffer,
        }
    }

    /// Creates a limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests_per_minute,
            Duration::from_millis(config.min_interval_ms),
            Duration::from_millis(config.safety_buffer_ms),
        )
    }

    /// Waits until a request is permitted, then records it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                window.prune(now);

                match self.wait_needed(&window, now) {
                    None => {
                        window.record(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Waiting for request slot");
            tokio::time::sleep(wait).await;
        }
    }

    /// Returns how long to wait before a grant is possible, or `None` if one is possible now.
    fn wait_needed(&self, window: &RateWindow, now: Instant) -> Option<Duration> {
        if let Some(last) = window.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < self.min_interval {
                return Some(self.min_interval - elapsed);
            }
        }

        if window.grants.len() >= self.max_requests {
            let oldest = *window.grants.front()?;
            let exits_at = oldest + WINDOW;
            return Some(exits_at.saturating_duration_since(now) + self.safety_buffer);
        }

        None
    }

    /// Returns the number of grants in the current window.
    pub async fn in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        window.prune(Instant::now());
        window.grants.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
