//! External stop signals for retry sessions.
//!
//! A stop signal is one-way: once asserted it stays asserted. The retry loop
//! polls it between attempts with [`StopSignal::is_stopped`] and races
//! [`StopSignal::stopped`] against the inter-attempt delay, so a signal that
//! can notify waiters ends a long delay early. Signals that can only be
//! polled (such as [`AtomicBool`]) keep the default `stopped` and are observed
//! at the next check point instead.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Assert-only cancellation flag consulted between attempts.
///
/// # Examples
///
/// ```rust
/// use rebound::stop::StopSignal;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_stopped());
/// token.cancel();
/// assert!(token.is_stopped());
/// ```
#[async_trait]
pub trait StopSignal: Send + Sync {
    /// Whether the signal has been asserted. Must not block.
    fn is_stopped(&self) -> bool;

    /// Complete once the signal is asserted.
    ///
    /// The default never completes, which is correct for signals that can
    /// only be polled.
    async fn stopped(&self) {
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl StopSignal for CancellationToken {
    fn is_stopped(&self) -> bool {
        self.is_cancelled()
    }

    async fn stopped(&self) {
        self.cancelled().await;
    }
}

#[async_trait]
impl StopSignal for AtomicBool {
    fn is_stopped(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StopSignal for watch::Receiver<bool> {
    fn is_stopped(&self) -> bool {
        *self.borrow()
    }

    async fn stopped(&self) {
        let mut rx = self.clone();
        // A dropped sender can never assert the signal.
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl<S: StopSignal + ?Sized> StopSignal for Arc<S> {
    fn is_stopped(&self) -> bool {
        (**self).is_stopped()
    }

    async fn stopped(&self) {
        (**self).stopped().await;
    }
}

#[async_trait]
impl<S: StopSignal + ?Sized> StopSignal for &S {
    fn is_stopped(&self) -> bool {
        (**self).is_stopped()
    }

    async fn stopped(&self) {
        (**self).stopped().await;
    }
}
