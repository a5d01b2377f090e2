//! Delay scaling with a ceiling.

use std::time::Duration;

/// Scale `current` by `factor`, capped at `max`.
///
/// The sign of `factor` is ignored, so `-2.0` doubles the delay just like
/// `2.0`. Fractional factors are applied at nanosecond precision and the
/// result is truncated to whole nanoseconds; products too large for a
/// [`Duration`] saturate at [`Duration::MAX`]. A factor of one returns
/// `current` unchanged. A `max` of `None` or zero means no ceiling.
///
/// # Examples
///
/// ```rust
/// use rebound::scale_duration;
/// use std::time::Duration;
///
/// let minute = Duration::from_secs(60);
/// assert_eq!(scale_duration(minute, None, 2.5), Duration::from_secs(150));
/// assert_eq!(scale_duration(minute, Some(3 * minute), 10.0), 3 * minute);
/// assert_eq!(scale_duration(minute, None, -2.0), 2 * minute);
/// ```
pub fn scale_duration(current: Duration, max: Option<Duration>, factor: f64) -> Duration {
    let factor = factor.abs();
    let scaled = if factor == 1.0 {
        current
    } else {
        let nanos = current.as_nanos() as f64 * factor;
        if nanos.is_nan() {
            Duration::ZERO
        } else if nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos as u64)
        } else {
            // Too many nanoseconds for a u64: scale in seconds instead.
            Duration::try_from_secs_f64(current.as_secs_f64() * factor).unwrap_or(Duration::MAX)
        }
    };

    match max {
        Some(max) if !max.is_zero() && scaled > max => max,
        _ => scaled,
    }
}

/// The sequence of inter-attempt delays for a retry session.
///
/// Yields `base`, then each previous value passed through [`scale_duration`].
/// The sequence is infinite; bound it with [`Iterator::take`].
///
/// # Examples
///
/// ```rust
/// use rebound::retry::DelaySchedule;
/// use std::time::Duration;
///
/// let minute = Duration::from_secs(60);
/// let delays: Vec<_> = DelaySchedule::new(minute, 2.0, Some(10 * minute))
///     .take(6)
///     .map(|d| d.as_secs() / 60)
///     .collect();
/// assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DelaySchedule {
    next: Duration,
    factor: f64,
    max: Option<Duration>,
}

impl DelaySchedule {
    /// Start a schedule at `base`.
    ///
    /// `base` itself is not capped: the ceiling applies to scaled values only.
    pub fn new(base: Duration, factor: f64, max: Option<Duration>) -> Self {
        Self {
            next: base,
            factor,
            max,
        }
    }

    /// The delay the next call to [`Iterator::next`] will return.
    pub fn peek(&self) -> Duration {
        self.next
    }

    pub(crate) fn advance(&mut self) -> Duration {
        let current = self.next;
        self.next = scale_duration(current, self.max, self.factor);
        current
    }
}

impl Iterator for DelaySchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.advance())
    }
}
