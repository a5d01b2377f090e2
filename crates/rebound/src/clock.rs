//! Time source abstraction for the retry loop.
//!
//! The loop only needs two things from time: a way to read "now" and a way to
//! wait for a duration. Abstracting both behind [`Clock`] lets production code
//! use the tokio timer ([`WallClock`]) while tests use [`MockClock`], which
//! records every requested delay and returns immediately.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A source of time for retry sessions.
///
/// # Examples
///
/// ```rust
/// use rebound::clock::{Clock, MockClock};
/// use std::time::Duration;
///
/// # async fn example() {
/// let clock = MockClock::new();
/// clock.after(Duration::from_secs(5)).await;
/// assert_eq!(clock.delays(), vec![Duration::from_secs(5)]);
/// # }
/// ```
#[async_trait]
pub trait Clock: fmt::Debug + Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Complete once `wait` has elapsed.
    ///
    /// The retry loop awaits this exactly once per inter-attempt delay.
    async fn after(&self, wait: Duration);
}

/// Real clock backed by [`tokio::time`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallClock;

#[async_trait]
impl Clock for WallClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn after(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn after(&self, wait: Duration) {
        (**self).after(wait).await;
    }
}

/// Clock double that never actually waits.
///
/// Every call to [`Clock::after`] is recorded and advances the clock's
/// virtual time by the requested duration, so [`Clock::now`] reflects the
/// time a real session would have spent sleeping. Clones share state.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    /// Create a mock clock whose virtual time starts at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a mock clock whose virtual time starts at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            delays: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all requested delays.
    pub fn elapsed(&self) -> Duration {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .fold(Duration::ZERO, |total, delay| total.saturating_add(*delay))
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    async fn after(&self, wait: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(wait);
    }
}
