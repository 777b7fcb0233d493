//! State shared by every session: status, clock, generator, event queue.

use std::time::Duration;

use playfield_random::{Fingerprint, SeededRandom};

use crate::{AchievementId, GameEvent, GameKind, GameStats, GameStatus, LeaderboardCandidate};

#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    kind: GameKind,
    status: GameStatus,
    elapsed: Duration,
    events: Vec<GameEvent>,
    /// Nothing is drawn before `start`.
    pub(crate) rng: SeededRandom,
    /// Every piece, tile, cell, or word generated from `rng`, in order.
    pub(crate) artifacts: Fingerprint,
}

impl Lifecycle {
    pub(crate) fn new(kind: GameKind, seed: i64) -> Self {
        Self {
            kind,
            status: GameStatus::Idle,
            elapsed: Duration::ZERO,
            events: Vec::new(),
            rng: SeededRandom::new(seed),
            artifacts: Fingerprint::default(),
        }
    }

    pub(crate) fn status(&self) -> GameStatus {
        self.status
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn transition(&mut self, to: GameStatus) -> bool {
        if !self.status.can_transition_to(to) {
            tracing::trace!(game = %self.kind, from = %self.status, to = %to, "transition refused");
            return false;
        }
        tracing::debug!(game = %self.kind, from = %self.status, to = %to, "session transition");
        self.status = to;
        true
    }

    /// Idle → Playing. A paused session goes back through `resume`.
    pub(crate) fn start(&mut self) -> bool {
        self.status == GameStatus::Idle && self.transition(GameStatus::Playing)
    }

    pub(crate) fn pause(&mut self) -> bool {
        self.status == GameStatus::Playing && self.transition(GameStatus::Paused)
    }

    pub(crate) fn resume(&mut self) -> bool {
        self.status == GameStatus::Paused && self.transition(GameStatus::Playing)
    }

    /// Moves the clock forward. Only counts while playing.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.elapsed += dt;
        true
    }

    /// Caps the clock, for games with a countdown.
    pub(crate) fn clamp_elapsed(&mut self, limit: Duration) {
        self.elapsed = self.elapsed.min(limit);
    }

    pub(crate) fn achieve(&mut self, id: AchievementId) {
        tracing::debug!(game = %self.kind, ?id, "achievement earned");
        self.events.push(GameEvent::Achievement { id });
    }

    /// Playing → `outcome`. Queues the first-win achievement on a win.
    /// Returns `false` (and queues nothing) if the session already ended.
    pub(crate) fn finish(&mut self, outcome: GameStatus) -> bool {
        if !outcome.is_terminal() || !self.transition(outcome) {
            return false;
        }
        if outcome == GameStatus::Won {
            self.achieve(AchievementId::FirstWin);
        }
        true
    }

    /// Queues the end-of-session records.
    pub(crate) fn report(&mut self, stats: GameStats, score: u64, qualifies: bool) {
        tracing::info!(
            game = %self.kind,
            status = %self.status,
            score,
            draws = self.rng.draws(),
            "session finished"
        );
        if qualifies {
            self.events.push(GameEvent::Leaderboard(LeaderboardCandidate {
                game: self.kind,
                score,
                metrics: stats.clone(),
            }));
        }
        self.events.push(GameEvent::Stats(stats.into()));
    }

    pub(crate) fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
