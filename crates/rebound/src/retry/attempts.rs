use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Attempt budget for a retry session.
///
/// A bounded budget counts every invocation, including the first.
/// `Attempts::Unlimited` removes the budget entirely: such a session only ends
/// on success, a fatal error, or the stop signal.
///
/// In configuration files the budget is written as a positive integer or the
/// string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AttemptsRepr", into = "AttemptsRepr")]
pub enum Attempts {
    /// At most this many invocations.
    Limited(NonZeroU32),
    /// No cap on invocations.
    Unlimited,
}

impl Attempts {
    /// A bounded budget, or `None` for zero.
    pub fn limited(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(Self::Limited)
    }

    /// The cap, if bounded.
    pub fn get(self) -> Option<u32> {
        match self {
            Self::Limited(count) => Some(count.get()),
            Self::Unlimited => None,
        }
    }

    /// Whether `attempt` (1-based) is the last one this budget permits.
    pub(crate) fn is_final(self, attempt: u32) -> bool {
        match self {
            Self::Limited(count) => attempt >= count.get(),
            Self::Unlimited => false,
        }
    }
}

impl From<NonZeroU32> for Attempts {
    fn from(count: NonZeroU32) -> Self {
        Self::Limited(count)
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(count) => write!(f, "{count}"),
            Self::Unlimited => f.write_str(UNLIMITED),
        }
    }
}

const UNLIMITED: &str = "unlimited";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AttemptsRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<AttemptsRepr> for Attempts {
    type Error = String;

    fn try_from(repr: AttemptsRepr) -> Result<Self, Self::Error> {
        match repr {
            AttemptsRepr::Count(count) => Attempts::limited(count)
                .ok_or_else(|| "attempt budget must be positive".to_string()),
            AttemptsRepr::Keyword(word) if word.eq_ignore_ascii_case(UNLIMITED) => {
                Ok(Attempts::Unlimited)
            }
            AttemptsRepr::Keyword(word) => Err(format!(
                "invalid attempt budget {word:?}, expected a positive integer or \"{UNLIMITED}\""
            )),
        }
    }
}

impl From<Attempts> for AttemptsRepr {
    fn from(attempts: Attempts) -> Self {
        match attempts {
            Attempts::Limited(count) => AttemptsRepr::Count(count.get()),
            Attempts::Unlimited => AttemptsRepr::Keyword(UNLIMITED.to_string()),
        }
    }
}
