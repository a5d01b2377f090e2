//! The retry loop and its configuration.
//!
//! # Key Types
//!
//! - [`RetryArgs`] - Builder for the raw session arguments
//! - [`RetryPolicy`] - Validated arguments that drive one session
//! - [`Attempts`] - Bounded or unlimited attempt budget
//! - [`DelaySchedule`] - The sequence of inter-attempt delays
//!
//! # Session lifecycle
//!
//! ```text
//! RetryArgs ──validate()──▶ RetryPolicy ──run()──▶ Result<T, RetryError<E>>
//!     │                                                 ▲
//!     └──────────────────── call() ─────────────────────┘
//! ```
//!
//! Each session invokes the operation, and on failure consults, in order, the
//! fatal classifier, the notify hook, the attempt budget and the stop signal
//! before waiting for the next delay.
//!
//! # Examples
//!
//! ```rust
//! use rebound::retry::{self, RetryArgs};
//! use rebound::clock::MockClock;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let clock = MockClock::new();
//! let result = retry::call(
//!     RetryArgs::new()
//!         .operation(|| async { Err::<(), _>(std::io::Error::other("bah")) })
//!         .attempts(5)
//!         .delay(Duration::from_secs(60))
//!         .backoff_factor(2.0)
//!         .max_delay(Duration::from_secs(600))
//!         .clock(clock.clone()),
//! )
//! .await;
//!
//! assert!(result.unwrap_err().is_attempts_exceeded());
//! assert_eq!(
//!     clock.delays(),
//!     [60, 120, 240, 480].map(Duration::from_secs).to_vec()
//! );
//! # }
//! ```

mod args;
mod attempts;
mod policy;
mod scale;

pub use args::RetryArgs;
pub use attempts::Attempts;
pub use policy::RetryPolicy;
pub use scale::{DelaySchedule, scale_duration};

use crate::error::RetryError;
use std::error::Error;

/// Validate `args` and run the session.
///
/// Returns the operation's value on success. A configuration error is
/// returned before the operation is ever invoked.
pub async fn call<T, E>(args: RetryArgs<'_, T, E>) -> Result<T, RetryError<E>>
where
    E: Error + Send + Sync + 'static,
{
    args.call().await
}
