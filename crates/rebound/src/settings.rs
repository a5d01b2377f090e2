//! Serializable retry settings.
//!
//! [`RetrySettings`] holds the numeric half of a retry policy so it can live
//! in a config file next to the rest of an application's settings. Durations
//! are written in milliseconds:
//!
//! ```toml
//! attempts = 5          # or "unlimited"
//! delay_ms = 250
//! backoff_factor = 2.0
//! max_delay_ms = 10000
//! ```
//!
//! Every field is optional. Apply the settings with
//! [`RetryArgs::with_settings`](crate::RetryArgs::with_settings); fields that
//! are absent leave the builder untouched, so a config file that forgets
//! `delay_ms` still fails validation with [`ConfigError::MissingDelay`](crate::ConfigError::MissingDelay).

use crate::retry::Attempts;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempt budget, delays and backoff factor for a retry session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    /// Attempt budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Attempts>,

    /// Delay before the second attempt.
    #[serde(
        default,
        rename = "delay_ms",
        with = "millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<Duration>,

    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,

    /// Ceiling for scaled delays.
    #[serde(
        default,
        rename = "max_delay_ms",
        with = "millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_delay: Option<Duration>,
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
