//! Lifecycle of one outgoing request
//!
//! ```text
//!  Idle --generate_request--> AwaitingCache --match_response--> Matched
//!                                  |  |
//!                                  |  +--------timer tick-----> Expired
//!                                  +-----------release--------> ReleasedEarly
//! ```
//!
//! The three right-hand states are terminal. An exchange leaves the message
//! cache on entering any of them.

use std::fmt::{self, Display};

/// State of a request correlated by message id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// No request cached under the handle
    #[default]
    Idle,
    /// Request sent, cached until a response, release or expiry
    AwaitingCache,
    /// Response received and matched
    Matched,
    /// Cache entry expired before a response arrived
    Expired,
    /// Released by the caller before a response arrived
    ReleasedEarly,
}

impl ExchangeState {
    /// Check if the exchange can still be matched
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingCache)
    }

    /// Check if the exchange is finished
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched | Self::Expired | Self::ReleasedEarly)
    }

    /// Get the next state after the request is cached
    #[must_use]
    pub const fn after_cached(&self) -> Self {
        match self {
            Self::Idle => Self::AwaitingCache,
            _ => *self,
        }
    }

    /// Get the next state after a response is matched
    #[must_use]
    pub const fn after_response(&self) -> Self {
        match self {
            Self::AwaitingCache => Self::Matched,
            _ => *self,
        }
    }

    /// Get the next state after the cache entry expires
    #[must_use]
    pub const fn after_expiry(&self) -> Self {
        match self {
            Self::AwaitingCache => Self::Expired,
            _ => *self,
        }
    }

    /// Get the next state after an explicit release
    #[must_use]
    pub const fn after_release(&self) -> Self {
        match self {
            Self::AwaitingCache => Self::ReleasedEarly,
            _ => *self,
        }
    }
}

impl Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingCache => write!(f, "AwaitingCache"),
            Self::Matched => write!(f, "Matched"),
            Self::Expired => write!(f, "Expired"),
            Self::ReleasedEarly => write!(f, "ReleasedEarly"),
        }
    }
}
