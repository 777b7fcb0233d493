//! Two-player battles for Playfield.
//!
//! Each player runs the full game locally. The battle layer only makes sure
//! both started from the same seed, relays what the opponent needs to see,
//! catches simulations that drift apart, and decides the winner.
//!
//! # Key types
//!
//! - [`Matchmaker`]: queues players per game, draws the seed, starts matches
//! - [`MatchHandle`]: commands for a running match actor
//! - [`SyncGuard`]: move ordering and generator checkpoint verification
//! - [`Arbiter`]: turns final reports, forfeits, and timeouts into an outcome
//! - [`MatchConfig`]: time limit and channel sizing

mod arbiter;
mod battle;
mod config;
mod error;
mod matchmaker;
mod sync;

pub use arbiter::Arbiter;
pub use battle::{MatchHandle, MatchInfo, PlayerSender};
pub use config::{MatchConfig, MatchState};
pub use error::BattleError;
pub use matchmaker::{FindResult, Matchmaker};
pub use sync::SyncGuard;
