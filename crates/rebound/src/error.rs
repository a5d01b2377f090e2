//! Error taxonomy for retry sessions.
//!
//! A session ends in one of four ways besides success, each with its own
//! [`RetryError`] variant:
//!
//! | Variant | Cause | Carries |
//! |---------|-------|---------|
//! | [`InvalidConfiguration`](RetryError::InvalidConfiguration) | validation rejected the arguments | [`ConfigError`] |
//! | [`Fatal`](RetryError::Fatal) | the classifier refused to retry | the original error, displayed unchanged |
//! | [`AttemptsExceeded`](RetryError::AttemptsExceeded) | the attempt budget ran out | the last operation error |
//! | [`Stopped`](RetryError::Stopped) | the stop signal was asserted | the last operation error |
//!
//! Callers that receive a retry error wrapped inside their own error types can
//! still classify it with [`is_attempts_exceeded`], [`is_retry_stopped`] and
//! [`is_invalid_configuration`], which walk the `source()` chain.

use std::error::Error;
use thiserror::Error;

/// Reasons a set of retry arguments is rejected before any attempt is made.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// No operation to retry.
    #[error("missing operation")]
    MissingOperation,

    /// No attempt budget, or a budget of zero.
    #[error("missing attempt budget")]
    MissingAttempts,

    /// No base delay.
    #[error("missing delay")]
    MissingDelay,

    /// Backoff factor below one, or not a finite number.
    #[error("invalid backoff factor of {0}")]
    InvalidBackoffFactor(f64),
}

/// Terminal failure of a retry session.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The arguments failed validation. The operation was never invoked.
    #[error("invalid retry configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The operation failed with an error the classifier marked as fatal.
    #[error(transparent)]
    Fatal(E),

    /// Every permitted attempt failed.
    #[error("attempt count exceeded: {last_error}")]
    AttemptsExceeded {
        /// Error returned by the final attempt.
        #[source]
        last_error: E,
    },

    /// The stop signal was asserted between attempts.
    #[error("retry stopped: {last_error}")]
    Stopped {
        /// Error returned by the attempt preceding the stop.
        #[source]
        last_error: E,
    },
}

/// Discriminant of a [`RetryError`], for branching without borrowing the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RetryError::InvalidConfiguration`].
    InvalidConfiguration,
    /// See [`RetryError::Fatal`].
    Fatal,
    /// See [`RetryError::AttemptsExceeded`].
    AttemptsExceeded,
    /// See [`RetryError::Stopped`].
    Stopped,
}

impl<E> RetryError<E> {
    /// Which terminal condition produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::Fatal(_) => ErrorKind::Fatal,
            Self::AttemptsExceeded { .. } => ErrorKind::AttemptsExceeded,
            Self::Stopped { .. } => ErrorKind::Stopped,
        }
    }

    /// True if the attempt budget was exhausted.
    pub fn is_attempts_exceeded(&self) -> bool {
        self.kind() == ErrorKind::AttemptsExceeded
    }

    /// True if the stop signal ended the session.
    pub fn is_stopped(&self) -> bool {
        self.kind() == ErrorKind::Stopped
    }

    /// True if the classifier marked the operation error as fatal.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }

    /// True if validation rejected the arguments.
    pub fn is_invalid_configuration(&self) -> bool {
        self.kind() == ErrorKind::InvalidConfiguration
    }

    /// The last error returned by the operation, if it was ever invoked.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::Fatal(err)
            | Self::AttemptsExceeded { last_error: err }
            | Self::Stopped { last_error: err } => Some(err),
        }
    }

    /// Consume the error, returning the last operation error if there is one.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::Fatal(err)
            | Self::AttemptsExceeded { last_error: err }
            | Self::Stopped { last_error: err } => Some(err),
        }
    }

    /// The validation failure, if this is a configuration error.
    pub fn config_error(&self) -> Option<ConfigError> {
        match self {
            Self::InvalidConfiguration(err) => Some(*err),
            _ => None,
        }
    }
}

fn chain<'e>(err: &'e (dyn Error + 'static)) -> impl Iterator<Item = &'e (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&err| err.source())
}

/// First [`RetryError<E>`] found in `err`'s source chain, starting at `err`.
fn find_retry_error<'e, E>(err: &'e (dyn Error + 'static)) -> Option<&'e RetryError<E>>
where
    E: Error + 'static,
{
    chain(err).find_map(|err| err.downcast_ref::<RetryError<E>>())
}

/// Whether `err`, or an error in its source chain, reports an exhausted
/// attempt budget.
///
/// `E` is the operation's error type. The outermost retry error in the chain
/// decides the answer.
///
/// # Examples
///
/// ```rust
/// use rebound::{RetryError, is_attempts_exceeded};
/// use std::io;
///
/// let err: RetryError<io::Error> = RetryError::AttemptsExceeded {
///     last_error: io::Error::other("bah"),
/// };
/// assert!(is_attempts_exceeded::<io::Error>(&err));
/// ```
pub fn is_attempts_exceeded<E>(err: &(dyn Error + 'static)) -> bool
where
    E: Error + 'static,
{
    find_retry_error::<E>(err).is_some_and(RetryError::is_attempts_exceeded)
}

/// Whether `err`, or an error in its source chain, reports a stopped session.
///
/// `E` is the operation's error type. The outermost retry error in the chain
/// decides the answer.
pub fn is_retry_stopped<E>(err: &(dyn Error + 'static)) -> bool
where
    E: Error + 'static,
{
    find_retry_error::<E>(err).is_some_and(RetryError::is_stopped)
}

/// Whether `err`, or an error in its source chain, is a [`ConfigError`].
///
/// Works for any operation error type, because [`RetryError::InvalidConfiguration`]
/// exposes its [`ConfigError`] as its source.
pub fn is_invalid_configuration(err: &(dyn Error + 'static)) -> bool {
    chain(err).any(|err| err.is::<ConfigError>())
}
