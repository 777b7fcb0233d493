//! Deciding who won.
//!
//! The arbiter only sees what the clients report: running [`Progress`] and
//! one [`FinalReport`] per side. It never simulates.
//!
//! | Mode | Decided when |
//! |---|---|
//! | `Survival` | a side tops out (it loses) or reaches its goal (it wins) |
//! | `Race` | a side wins; if both lose, on score |
//! | `HighScore` | both sides finish, on score |
//!
//! Disconnecting is a forfeit in every mode. When the time limit expires
//! the latest known scores decide, and equal scores are a draw.

use std::cmp::Ordering;

use playfield_games::GameStatus;
use playfield_protocol::{ArbitrationMode, FinalReport, MatchOutcome, PlayerId, Progress};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Side {
    latest: Option<Progress>,
    finished: Option<FinalReport>,
}

impl Side {
    fn score(&self) -> u64 {
        match (&self.finished, &self.latest) {
            (Some(report), _) => report.score,
            (None, Some(progress)) => progress.score,
            (None, None) => 0,
        }
    }
}

#[derive(Debug)]
pub struct Arbiter {
    mode: ArbitrationMode,
    players: [PlayerId; 2],
    sides: [Side; 2],
}

impl Arbiter {
    pub fn new(mode: ArbitrationMode, players: [PlayerId; 2]) -> Self {
        Self {
            mode,
            players,
            sides: Default::default(),
        }
    }

    pub fn mode(&self) -> ArbitrationMode {
        self.mode
    }

    fn index(&self, player: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| *p == player)
    }

    /// Remembers the latest running score. Never decides the match.
    pub fn record_progress(&mut self, player: PlayerId, progress: Progress) {
        if let Some(i) = self.index(player) {
            self.sides[i].latest = Some(progress);
        }
    }

    /// Records a side's final report and returns the outcome if it
    /// decides the match.
    pub fn record_finish(
        &mut self,
        player: PlayerId,
        report: &FinalReport,
    ) -> Option<MatchOutcome> {
        let i = self.index(player)?;
        if self.sides[i].finished.is_some() {
            warn!(%player, "duplicate final report ignored");
            return None;
        }
        if !report.status.is_terminal() {
            warn!(%player, status = %report.status, "final report for a live session ignored");
            return None;
        }
        self.sides[i].finished = Some(report.clone());
        let opponent = self.players[1 - i];
        debug!(
            %player,
            status = %report.status,
            score = report.score,
            mode = %self.mode,
            "side finished"
        );

        match (self.mode, report.status) {
            (ArbitrationMode::Survival, GameStatus::Lost) => Some(MatchOutcome::Winner(opponent)),
            (ArbitrationMode::Survival | ArbitrationMode::Race, GameStatus::Won) => {
                Some(MatchOutcome::Winner(player))
            }
            _ => self.both_finished(),
        }
    }

    fn both_finished(&self) -> Option<MatchOutcome> {
        let [Some(a), Some(b)] = [&self.sides[0].finished, &self.sides[1].finished] else {
            return None;
        };
        let rank = |r: &FinalReport| (r.status == GameStatus::Won, r.score);
        Some(self.compare(rank(a).cmp(&rank(b))))
    }

    fn compare(&self, ordering: Ordering) -> MatchOutcome {
        match ordering {
            Ordering::Greater => MatchOutcome::Winner(self.players[0]),
            Ordering::Less => MatchOutcome::Winner(self.players[1]),
            Ordering::Equal => MatchOutcome::Draw,
        }
    }

    /// `player` left. The other side wins.
    pub fn forfeit(&self, player: PlayerId) -> MatchOutcome {
        match self.index(player) {
            Some(i) => MatchOutcome::Winner(self.players[1 - i]),
            None => MatchOutcome::Aborted(format!("{player} is not in this match")),
        }
    }

    /// The time limit expired: higher latest score wins.
    pub fn time_up(&self) -> MatchOutcome {
        self.compare(self.sides[0].score().cmp(&self.sides[1].score()))
    }
}

#[cfg(test)]
mod tests {
    use playfield_games::GameStats;
    use playfield_random::{Checkpoint, Fingerprint};

    use super::*;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    fn progress(score: u64) -> Progress {
        Progress {
            status: GameStatus::Playing,
            score,
            elapsed_ms: 1_000,
            checkpoint: Checkpoint { draws: 0, state: 1 },
            fingerprint: Fingerprint::default(),
        }
    }

    fn report(status: GameStatus, score: u64) -> FinalReport {
        FinalReport {
            status,
            score,
            elapsed_ms: 5_000,
            checkpoint: Checkpoint { draws: 0, state: 1 },
            fingerprint: Fingerprint::default(),
            stats: GameStats::Snake { score, length: 3 },
        }
    }

    #[test]
    fn test_survival_first_loss_decides() {
        let mut arbiter = Arbiter::new(ArbitrationMode::Survival, [A, B]);
        let outcome = arbiter.record_finish(A, &report(GameStatus::Lost, 900));
        assert_eq!(outcome, Some(MatchOutcome::Winner(B)));
    }

    #[test]
    fn test_race_first_win_decides() {
        let mut arbiter = Arbiter::new(ArbitrationMode::Race, [A, B]);
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Won, 10)),
            Some(MatchOutcome::Winner(B))
        );
    }

    #[test]
    fn test_race_loss_waits_for_opponent() {
        let mut arbiter = Arbiter::new(ArbitrationMode::Race, [A, B]);
        assert_eq!(arbiter.record_finish(A, &report(GameStatus::Lost, 30)), None);
        // The opponent can still win outright.
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Won, 5)),
            Some(MatchOutcome::Winner(B))
        );
    }

    #[test]
    fn test_race_both_lost_compares_scores() {
        let mut arbiter = Arbiter::new(ArbitrationMode::Race, [A, B]);
        arbiter.record_finish(A, &report(GameStatus::Lost, 30));
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Lost, 12)),
            Some(MatchOutcome::Winner(A))
        );
    }

    #[test]
    fn test_high_score_waits_for_both() {
        let mut arbiter = Arbiter::new(ArbitrationMode::HighScore, [A, B]);
        assert_eq!(arbiter.record_finish(A, &report(GameStatus::Lost, 400)), None);
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Lost, 400)),
            Some(MatchOutcome::Draw)
        );
    }

    #[test]
    fn test_high_score_win_outranks_score() {
        let mut arbiter = Arbiter::new(ArbitrationMode::HighScore, [A, B]);
        arbiter.record_finish(A, &report(GameStatus::Lost, 5_000));
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Won, 3_000)),
            Some(MatchOutcome::Winner(B))
        );
    }

    #[test]
    fn test_duplicate_and_live_reports_ignored() {
        let mut arbiter = Arbiter::new(ArbitrationMode::HighScore, [A, B]);
        assert_eq!(arbiter.record_finish(A, &report(GameStatus::Playing, 1)), None);
        arbiter.record_finish(A, &report(GameStatus::Lost, 10));
        assert_eq!(arbiter.record_finish(A, &report(GameStatus::Lost, 99)), None);
        assert_eq!(
            arbiter.record_finish(B, &report(GameStatus::Lost, 20)),
            Some(MatchOutcome::Winner(B))
        );
    }

    #[test]
    fn test_forfeit() {
        let arbiter = Arbiter::new(ArbitrationMode::Race, [A, B]);
        assert_eq!(arbiter.forfeit(A), MatchOutcome::Winner(B));
        assert_eq!(arbiter.forfeit(B), MatchOutcome::Winner(A));
        assert!(matches!(arbiter.forfeit(PlayerId(3)), MatchOutcome::Aborted(_)));
    }

    #[test]
    fn test_time_up_uses_latest_scores() {
        let mut arbiter = Arbiter::new(ArbitrationMode::HighScore, [A, B]);
        assert_eq!(arbiter.time_up(), MatchOutcome::Draw);

        arbiter.record_progress(A, progress(120));
        arbiter.record_progress(B, progress(80));
        assert_eq!(arbiter.time_up(), MatchOutcome::Winner(A));

        // A final report overrides running progress.
        arbiter.record_finish(B, &report(GameStatus::Lost, 500));
        assert_eq!(arbiter.time_up(), MatchOutcome::Winner(B));
    }
}
