//! Outgoing-action pacing for the arena bot.
//!
//! The server throttles challenges: a second `/challenge` sent too soon
//! after the first is refused. [`RateLimiter`] enforces a minimum interval
//! between two paced actions by suspending the caller until the interval
//! has elapsed.
//!
//! This is a cooperative delay, not a queue. There is one limiter per
//! session and only one outstanding paced action at a time.
//!
//! ```ignore
//! limiter.wait().await;           // sleeps only if the last action was recent
//! conn.send(&challenge).await?;
//! limiter.mark();                 // the interval restarts from here
//! ```
//!
//! Time comes from `tokio::time`, so tests can pause and advance the clock.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, info};

/// Minimum interval between two outgoing challenges.
pub const CHALLENGE_INTERVAL: Duration = Duration::from_secs(10);

/// Enforces a minimum interval between consecutive paced actions.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    /// When the last paced action completed. `None` until the first one.
    last: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum interval.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Creates a limiter with the server's challenge interval.
    pub fn for_challenges() -> Self {
        Self::new(CHALLENGE_INTERVAL)
    }

    /// The configured minimum interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long the next action would have to wait right now.
    pub fn remaining(&self) -> Duration {
        match self.last {
            Some(last) => {
                let ready_at = last + self.min_interval;
                ready_at.saturating_duration_since(Instant::now())
            }
            None => Duration::ZERO,
        }
    }

    /// Suspends until the next action is allowed. Returns how long it slept.
    pub async fn wait(&self) -> Duration {
        let remaining = self.remaining();
        if remaining.is_zero() {
            debug!("no pacing delay needed");
            return Duration::ZERO;
        }

        info!(
            delay_ms = remaining.as_millis() as u64,
            "last paced action was too recent, waiting"
        );
        time::sleep(remaining).await;
        remaining
    }

    /// Records that a paced action just completed.
    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }

    /// Waits, runs `action`, then records its completion.
    pub async fn pace<F, T>(&mut self, action: F) -> T
    where
        F: Future<Output = T>,
    {
        self.wait().await;
        let out = action.await;
        self.mark();
        out
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::for_challenges()
    }
}
