use super::attempts::Attempts;
use super::policy::RetryPolicy;
use crate::clock::{Clock, WallClock};
use crate::error::{ConfigError, RetryError};
use crate::settings::RetrySettings;
use crate::stop::StopSignal;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub(crate) type Operation<'a, T, E> = Box<dyn FnMut() -> BoxFuture<'a, Result<T, E>> + Send + 'a>;
pub(crate) type FatalClassifier<'a, E> = Box<dyn Fn(&E) -> bool + Send + Sync + 'a>;
pub(crate) type NotifyHook<'a, E> = Box<dyn FnMut(&E, u32) + Send + 'a>;
pub(crate) type BoxStopSignal<'a> = Box<dyn StopSignal + 'a>;

/// Raw arguments for one retry session.
///
/// Every setter is optional at the type level; [`validate`](Self::validate)
/// checks that the required ones (operation, attempt budget, delay) were
/// supplied and fills in defaults for the rest:
///
/// | Field | Default |
/// |-------|---------|
/// | `backoff_factor` | `1.0` (constant delay) |
/// | `max_delay` | none |
/// | `clock` | [`WallClock`] |
///
/// # Examples
///
/// ```rust
/// use rebound::{ErrorKind, RetryArgs};
/// use rebound::clock::MockClock;
/// use std::time::Duration;
///
/// # async fn example() {
/// let clock = MockClock::new();
/// let err = RetryArgs::new()
///     .operation(|| async { Err::<(), _>(std::io::Error::other("bah")) })
///     .attempts(4)
///     .delay(Duration::from_secs(60))
///     .backoff_factor(2.0)
///     .clock(clock.clone())
///     .call()
///     .await
///     .unwrap_err();
///
/// assert_eq!(err.kind(), ErrorKind::AttemptsExceeded);
/// assert_eq!(clock.delays().len(), 3);
/// # }
/// ```
pub struct RetryArgs<'a, T, E> {
    operation: Option<Operation<'a, T, E>>,
    attempts: Option<Attempts>,
    delay: Option<Duration>,
    backoff_factor: Option<f64>,
    max_delay: Option<Duration>,
    is_fatal: Option<FatalClassifier<'a, E>>,
    notify: Option<NotifyHook<'a, E>>,
    stop: Option<BoxStopSignal<'a>>,
    clock: Option<Arc<dyn Clock>>,
}

impl<'a, T, E> RetryArgs<'a, T, E> {
    /// Empty arguments. At least an operation, an attempt budget and a delay
    /// must be set before the session can run.
    pub fn new() -> Self {
        Self {
            operation: None,
            attempts: None,
            delay: None,
            backoff_factor: None,
            max_delay: None,
            is_fatal: None,
            notify: None,
            stop: None,
            clock: None,
        }
    }

    /// The fallible operation to retry.
    pub fn operation<F, Fut>(mut self, mut operation: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.operation = Some(Box::new(move || -> BoxFuture<'a, Result<T, E>> {
            Box::pin(operation())
        }));
        self
    }

    /// Cap the session at `count` invocations. Zero leaves the budget unset.
    pub fn attempts(mut self, count: u32) -> Self {
        self.attempts = Attempts::limited(count);
        self
    }

    /// Retry until success, a fatal error, or the stop signal.
    pub fn unlimited_attempts(mut self) -> Self {
        self.attempts = Some(Attempts::Unlimited);
        self
    }

    /// Set the attempt budget directly.
    pub fn attempt_budget(mut self, attempts: Attempts) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Delay before the second attempt. Later delays are derived from it.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Multiply the delay by `factor` after each failed attempt.
    ///
    /// Must be at least `1.0`.
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    /// Ceiling for scaled delays. Zero means no ceiling.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay).filter(|max| !max.is_zero());
        self
    }

    /// Errors for which `is_fatal` returns true end the session immediately.
    pub fn is_fatal_error<P>(mut self, is_fatal: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'a,
    {
        self.is_fatal = Some(Box::new(is_fatal));
        self
    }

    /// Called with the error and the 1-based attempt number after every
    /// failed attempt that is not fatal.
    pub fn notify<N>(mut self, notify: N) -> Self
    where
        N: FnMut(&E, u32) + Send + 'a,
    {
        self.notify = Some(Box::new(notify));
        self
    }

    /// Signal that prevents further attempts once asserted.
    ///
    /// The first attempt always runs, and an attempt in flight is never
    /// interrupted.
    pub fn stop<S>(mut self, stop: S) -> Self
    where
        S: StopSignal + 'a,
    {
        self.stop = Some(Box::new(stop));
        self
    }

    /// Time source used for inter-attempt delays.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Copy every field present in `settings` into these arguments.
    pub fn with_settings(mut self, settings: &RetrySettings) -> Self {
        if let Some(attempts) = settings.attempts {
            self.attempts = Some(attempts);
        }
        if let Some(delay) = settings.delay {
            self.delay = Some(delay);
        }
        if let Some(factor) = settings.backoff_factor {
            self.backoff_factor = Some(factor);
        }
        if let Some(max_delay) = settings.max_delay {
            self = self.max_delay(max_delay);
        }
        self
    }

    /// Check the arguments and resolve defaults.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// operation, attempt budget, delay, backoff factor.
    pub fn validate(self) -> Result<RetryPolicy<'a, T, E>, ConfigError> {
        let operation = self.operation.ok_or(ConfigError::MissingOperation)?;
        let attempts = self.attempts.ok_or(ConfigError::MissingAttempts)?;
        let delay = self.delay.ok_or(ConfigError::MissingDelay)?;

        let backoff_factor = match self.backoff_factor {
            None => 1.0,
            Some(factor) if factor.is_finite() && factor >= 1.0 => factor,
            Some(factor) => return Err(ConfigError::InvalidBackoffFactor(factor)),
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(WallClock));

        Ok(RetryPolicy {
            operation,
            attempts,
            delay,
            backoff_factor,
            max_delay: self.max_delay,
            is_fatal: self.is_fatal,
            notify: self.notify,
            stop: self.stop,
            clock,
        })
    }

    /// Validate and run the session. Shorthand for [`crate::call`].
    pub async fn call(self) -> Result<T, RetryError<E>>
    where
        E: Error + Send + Sync + 'static,
    {
        self.validate()?.run().await
    }
}

impl<T, E> Default for RetryArgs<'_, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for RetryArgs<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryArgs")
            .field("operation", &self.operation.as_ref().map(|_| "<operation>"))
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .field("is_fatal", &self.is_fatal.as_ref().map(|_| "<classifier>"))
            .field("notify", &self.notify.as_ref().map(|_| "<hook>"))
            .field("stop", &self.stop.as_ref().map(|_| "<signal>"))
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use rstest::rstest;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing() -> RetryArgs<'static, (), io::Error> {
        RetryArgs::new().operation(|| async { Err(io::Error::other("bah")) })
    }

    #[test]
    fn test_defaults() {
        let policy = failing()
            .attempts(5)
            .delay(Duration::from_secs(60))
            .validate()
            .unwrap();

        assert_eq!(policy.attempts(), Attempts::limited(5).unwrap());
        assert_eq!(policy.delay(), Duration::from_secs(60));
        assert_eq!(policy.backoff_factor(), 1.0);
        assert_eq!(policy.max_delay(), None);
        assert_eq!(format!("{:?}", policy.clock()), "WallClock");
    }

    #[test]
    fn test_explicit_values_survive_validation() {
        let policy = failing()
            .unlimited_attempts()
            .delay(Duration::ZERO)
            .backoff_factor(1.5)
            .max_delay(Duration::from_secs(10))
            .clock(MockClock::new())
            .validate()
            .unwrap();

        assert_eq!(policy.attempts(), Attempts::Unlimited);
        assert_eq!(policy.delay(), Duration::ZERO);
        assert_eq!(policy.backoff_factor(), 1.5);
        assert_eq!(policy.max_delay(), Some(Duration::from_secs(10)));
        assert!(format!("{:?}", policy.clock()).starts_with("MockClock"));
    }

    #[test]
    fn test_zero_max_delay_means_unbounded() {
        let policy = failing()
            .attempts(1)
            .delay(Duration::from_secs(1))
            .max_delay(Duration::ZERO)
            .validate()
            .unwrap();
        assert_eq!(policy.max_delay(), None);
    }

    #[test]
    fn test_missing_operation() {
        let err = RetryArgs::<(), io::Error>::new()
            .attempts(5)
            .delay(Duration::from_secs(60))
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingOperation);
    }

    #[test]
    fn test_missing_attempts() {
        let err = failing().delay(Duration::from_secs(60)).validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingAttempts);

        let err = failing()
            .attempts(0)
            .delay(Duration::from_secs(60))
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingAttempts);
    }

    #[test]
    fn test_missing_delay() {
        let err = failing().attempts(5).validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingDelay);
    }

    #[rstest]
    #[case::negative(-2.0)]
    #[case::fractional(0.5)]
    #[case::zero(0.0)]
    #[case::infinite(f64::INFINITY)]
    fn test_invalid_backoff_factor(#[case] factor: f64) {
        let err = failing()
            .attempts(5)
            .delay(Duration::from_secs(60))
            .backoff_factor(factor)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidBackoffFactor(factor));
        assert!(err.to_string().starts_with("invalid backoff factor of "));
    }

    #[test]
    fn test_nan_backoff_factor_is_rejected() {
        let err = failing()
            .attempts(5)
            .delay(Duration::from_secs(60))
            .backoff_factor(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackoffFactor(f) if f.is_nan()));
    }

    #[test]
    fn test_first_failing_check_wins() {
        let err = RetryArgs::<(), io::Error>::new()
            .backoff_factor(0.1)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingOperation);

        let err = failing().backoff_factor(0.1).validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingAttempts);

        let err = failing().attempts(2).backoff_factor(0.1).validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingDelay);
    }

    #[test]
    fn test_validation_never_invokes_operation() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let args = RetryArgs::new()
            .operation(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, io::Error>(()) }
            })
            .attempts(3);

        assert_eq!(args.validate().unwrap_err(), ConfigError::MissingDelay);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_settings_only_overrides_present_fields() {
        let settings = RetrySettings {
            attempts: Some(Attempts::Unlimited),
            delay: None,
            backoff_factor: Some(3.0),
            max_delay: Some(Duration::from_secs(30)),
        };

        let policy = failing()
            .attempts(2)
            .delay(Duration::from_secs(5))
            .with_settings(&settings)
            .validate()
            .unwrap();

        assert_eq!(policy.attempts(), Attempts::Unlimited);
        assert_eq!(policy.delay(), Duration::from_secs(5));
        assert_eq!(policy.backoff_factor(), 3.0);
        assert_eq!(policy.max_delay(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_debug_hides_closures() {
        let rendered = format!("{:?}", failing().attempts(1));
        assert!(rendered.contains("<operation>"));
        assert!(rendered.contains("Limited(1)"));
    }
}
