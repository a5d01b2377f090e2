use super::args::{BoxStopSignal, FatalClassifier, NotifyHook, Operation};
use super::attempts::Attempts;
use super::scale::DelaySchedule;
use crate::clock::Clock;
use crate::error::RetryError;
use crate::stop::StopSignal;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Validated, fully-defaulted arguments for one retry session.
///
/// Produced by [`RetryArgs::validate`](super::RetryArgs::validate) and
/// consumed by [`run`](Self::run), so a policy drives exactly one session.
pub struct RetryPolicy<'a, T, E> {
    pub(super) operation: Operation<'a, T, E>,
    pub(super) attempts: Attempts,
    pub(super) delay: Duration,
    pub(super) backoff_factor: f64,
    pub(super) max_delay: Option<Duration>,
    pub(super) is_fatal: Option<FatalClassifier<'a, E>>,
    pub(super) notify: Option<NotifyHook<'a, E>>,
    pub(super) stop: Option<BoxStopSignal<'a>>,
    pub(super) clock: Arc<dyn Clock>,
}

impl<'a, T, E> RetryPolicy<'a, T, E> {
    /// The attempt budget.
    pub fn attempts(&self) -> Attempts {
        self.attempts
    }

    /// Delay before the second attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolved backoff factor. `1.0` when none was supplied.
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Ceiling for scaled delays, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Time source for inter-attempt delays.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The delays this policy would wait for, in order, if every attempt
    /// failed and no stop signal fired.
    pub fn schedule(&self) -> DelaySchedule {
        DelaySchedule::new(self.delay, self.backoff_factor, self.max_delay)
    }

    fn is_stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| stop.is_stopped())
    }

    /// Run the session to completion.
    ///
    /// After each failure the checks run in this order: fatal classifier,
    /// notify hook, attempt budget, stop signal. Budget exhaustion therefore
    /// wins over a stop signal asserted during the final permitted attempt.
    /// No delay follows the final attempt.
    pub async fn run(mut self) -> Result<T, RetryError<E>>
    where
        E: Error + Send + Sync + 'static,
    {
        let mut schedule = self.schedule();
        let mut attempt: u32 = 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            attempts = %self.attempts,
            delay = ?self.delay,
            backoff_factor = self.backoff_factor,
            max_delay = ?self.max_delay,
            "retry session started"
        );

        loop {
            let err = match (self.operation)().await {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };

            if self.is_fatal.as_ref().is_some_and(|is_fatal| is_fatal(&err)) {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, error = %err, "fatal error, not retrying");
                return Err(RetryError::Fatal(err));
            }

            if let Some(notify) = self.notify.as_mut() {
                notify(&err, attempt);
            }

            if self.attempts.is_final(attempt) {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, error = %err, "attempt budget exhausted");
                return Err(RetryError::AttemptsExceeded { last_error: err });
            }

            if self.is_stopped() {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, error = %err, "retry stopped");
                return Err(RetryError::Stopped { last_error: err });
            }

            let delay = schedule.advance();

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, ?delay, error = %err, "attempt failed, retrying");

            if !pause(&*self.clock, self.stop.as_deref(), delay).await {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, "retry stopped during delay");
                return Err(RetryError::Stopped { last_error: err });
            }

            attempt = attempt.saturating_add(1);
        }
    }
}

/// Wait out `delay`, waking early if `stop` fires. Returns false if the
/// session must not make another attempt.
async fn pause(clock: &dyn Clock, stop: Option<&dyn StopSignal>, delay: Duration) -> bool {
    let Some(stop) = stop else {
        clock.after(delay).await;
        return true;
    };

    tokio::select! {
        biased;
        () = clock.after(delay) => {}
        () = stop.stopped() => {}
    }

    !stop.is_stopped()
}

impl<T, E> fmt::Debug for RetryPolicy<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .field("is_fatal", &self.is_fatal.is_some())
            .field("notify", &self.notify.is_some())
            .field("stop", &self.stop.is_some())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
