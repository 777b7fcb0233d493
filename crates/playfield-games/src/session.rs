//! The contract shared by every game.

use std::fmt;
use std::time::Duration;

use playfield_random::{Checkpoint, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::{GameEvent, GameKind, GameStats, GameStatus};

/// A single game session.
///
/// Implementations are plain synchronous state machines. Time only moves
/// when the owner calls [`tick`](Self::tick), and randomness only comes from
/// the session's own seeded generator, so two sessions built from the same
/// seed produce the same artifacts no matter who owns them.
///
/// # Contract
///
/// - `start`, `pause`, `resume`, `apply`, and `tick` return `false` and
///   change nothing when the call is not legal in the current state.
/// - Once the status is terminal, nothing changes again.
/// - Entering `Won` or `Lost` queues the stats record, the leaderboard
///   candidate (if it qualifies), and any achievements.
pub trait GameSession: Send + 'static {
    /// Player input understood by this game.
    type Input: Clone + fmt::Debug + Send + 'static;

    fn kind(&self) -> GameKind;

    fn status(&self) -> GameStatus;

    /// Idle → Playing. Builds the board and performs the first draws.
    fn start(&mut self) -> bool;

    /// Playing → Paused.
    fn pause(&mut self) -> bool;

    /// Paused → Playing.
    fn resume(&mut self) -> bool;

    /// Applies one input. Returns `true` if the session changed.
    fn apply(&mut self, input: Self::Input) -> bool;

    /// Advances the session clock by `dt`. Returns `true` if the board
    /// changed (gravity step, snake step, timeout, ...).
    fn tick(&mut self, dt: Duration) -> bool;

    fn score(&self) -> u64;

    /// Time spent in `Playing`.
    fn elapsed(&self) -> Duration;

    /// Current position of the session's generator.
    fn rng_checkpoint(&self) -> Checkpoint;

    /// Running fingerprint of what the generator produced, so opponents
    /// can tell a shared stream from a shared outcome.
    fn fingerprint(&self) -> Fingerprint;

    /// Final (or current) statistics.
    fn stats(&self) -> GameStats;

    /// Takes every event queued since the last drain.
    fn drain_events(&mut self) -> Vec<GameEvent>;

    /// Summary of the session for observers.
    fn view(&self) -> SessionView {
        SessionView {
            kind: self.kind(),
            status: self.status(),
            score: self.score(),
            elapsed_ms: self.elapsed().as_millis() as u64,
            checkpoint: self.rng_checkpoint(),
            fingerprint: self.fingerprint(),
        }
    }
}

/// A snapshot of the parts of a session every game has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub kind: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub elapsed_ms: u64,
    pub checkpoint: Checkpoint,
    pub fingerprint: Fingerprint,
}
