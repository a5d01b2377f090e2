#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Deterministic retry-with-backoff for fallible async operations.
//!
//! `rebound` re-invokes an operation until one of four things happens:
//!
//! - the operation succeeds
//! - a caller-supplied classifier marks the error as fatal
//! - the attempt budget runs out
//! - an external stop signal is asserted
//!
//! Delays between attempts grow by a constant factor and can be capped. There
//! is no jitter: given the same inputs, a session always waits for the same
//! sequence of delays, which makes retry behaviour easy to test with
//! [`clock::MockClock`].
//!
//! # Examples
//!
//! ```rust
//! use rebound::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let value = RetryArgs::new()
//!     .operation(|| async { Ok::<_, std::io::Error>(42) })
//!     .attempts(3)
//!     .delay(Duration::from_millis(100))
//!     .backoff_factor(2.0)
//!     .call()
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod retry;
pub mod settings;
pub mod stop;

pub use error::{
    ConfigError, ErrorKind, RetryError, is_attempts_exceeded, is_invalid_configuration,
    is_retry_stopped,
};
pub use retry::{Attempts, RetryArgs, RetryPolicy, call, scale_duration};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use rebound::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, MockClock, WallClock};
    pub use crate::error::{ConfigError, ErrorKind, RetryError};
    pub use crate::retry::{Attempts, DelaySchedule, RetryArgs, RetryPolicy, scale_duration};
    pub use crate::settings::RetrySettings;
    pub use crate::stop::StopSignal;
}
