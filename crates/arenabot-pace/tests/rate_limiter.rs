//! Timing tests for the challenge rate limiter.
//!
//! Uses a paused Tokio clock: sleeps complete instantly by auto-advancing
//! time, and `Instant::now()` reports the virtual time, so the assertions
//! measure exactly what the limiter asked for.

use std::time::Duration;

use arenabot_pace::{CHALLENGE_INTERVAL, RateLimiter};
use tokio::time::{self, Instant};

#[tokio::test(start_paused = true)]
async fn test_second_call_within_interval_is_delayed_until_interval_elapses() {
    let mut limiter = RateLimiter::for_challenges();

    let first = limiter.pace(async { Instant::now() }).await;
    time::advance(Duration::from_secs(3)).await;
    let second = limiter.pace(async { Instant::now() }).await;

    assert!(second - first >= CHALLENGE_INTERVAL);
    assert_eq!(second - first, CHALLENGE_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_calls_at_least_interval_apart_are_not_delayed() {
    let mut limiter = RateLimiter::for_challenges();

    limiter.pace(async {}).await;
    time::advance(Duration::from_secs(12)).await;

    let before = Instant::now();
    let waited = limiter.wait().await;

    assert_eq!(waited, Duration::ZERO);
    assert_eq!(Instant::now(), before);
}

#[tokio::test(start_paused = true)]
async fn test_first_call_is_never_delayed() {
    let limiter = RateLimiter::for_challenges();

    let before = Instant::now();
    let waited = limiter.wait().await;

    assert_eq!(waited, Duration::ZERO);
    assert_eq!(Instant::now(), before);
}

#[tokio::test(start_paused = true)]
async fn test_interval_restarts_from_completion_not_start() {
    let mut limiter = RateLimiter::new(Duration::from_secs(10));

    // An action that itself takes 4 seconds.
    limiter
        .pace(async { time::sleep(Duration::from_secs(4)).await })
        .await;
    let finished = Instant::now();

    limiter.pace(async {}).await;

    assert_eq!(Instant::now() - finished, Duration::from_secs(10));
}
