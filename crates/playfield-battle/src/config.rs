//! Match configuration and lifecycle.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every match a [`Matchmaker`](crate::Matchmaker)
/// creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// How long a match may run before it is decided on the latest
    /// reported scores. `Duration::ZERO` disables the limit.
    pub time_limit: Duration,

    /// Capacity of each match actor's command channel.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(180),
            channel_size: 64,
        }
    }
}

impl MatchConfig {
    pub fn time_limit_ms(&self) -> u64 {
        self.time_limit.as_millis() as u64
    }
}

/// The lifecycle state of a match.
///
/// ```text
/// Starting → InProgress → Finished
/// ```
///
/// - **Starting**: both players known, `MatchStarted` not yet sent.
/// - **InProgress**: moves and progress are being relayed.
/// - **Finished**: an outcome was sent; the actor is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    Starting,
    InProgress,
    Finished,
}

impl MatchState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Starting => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
