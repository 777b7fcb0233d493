//! Plain records handed to the stats, leaderboard, and achievement
//! collaborators when a session ends.
//!
//! Sessions never talk to those collaborators directly. They queue
//! [`GameEvent`]s which the owner drains with
//! [`GameSession::drain_events`](crate::GameSession::drain_events).

use serde::{Deserialize, Serialize};

use crate::GameKind;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Per-game final statistics.
///
/// One variant per game, so a stats record can never carry another game's
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameStats {
    Tetris {
        score: u64,
        lines: u32,
        level: u32,
        pieces: u32,
    },
    #[serde(rename = "2048")]
    Game2048 {
        score: u64,
        max_tile: u32,
        moves: u32,
        undos: u32,
    },
    Snake {
        score: u64,
        length: u32,
    },
    Minesweeper {
        rows: u16,
        cols: u16,
        mines: u16,
        revealed: u32,
        won: bool,
        elapsed_ms: u64,
    },
    Typing {
        wpm: f64,
        accuracy: f64,
        correct_chars: u32,
        errors: u32,
        elapsed_ms: u64,
    },
}

impl GameStats {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Tetris { .. } => GameKind::Tetris,
            Self::Game2048 { .. } => GameKind::Game2048,
            Self::Snake { .. } => GameKind::Snake,
            Self::Minesweeper { .. } => GameKind::Minesweeper,
            Self::Typing { .. } => GameKind::Typing,
        }
    }
}

/// The record pushed to the stats collaborator: `{ gameType, stats }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub game_type: GameKind,
    pub stats: GameStats,
}

impl From<GameStats> for StatsRecord {
    fn from(stats: GameStats) -> Self {
        Self {
            game_type: stats.kind(),
            stats,
        }
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// A qualifying result offered to the leaderboard.
///
/// The nickname and timestamp are attached by whoever submits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardCandidate {
    pub game: GameKind,
    pub score: u64,
    pub metrics: GameStats,
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// Achievement identifiers. Deduplication across sessions is the
/// achievement store's job; sessions emit an id every time it is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementId {
    FirstWin,
    /// Four lines cleared by a single piece.
    LineClearTetris,
    #[serde(rename = "tile-2048")]
    Tile2048,
    #[serde(rename = "snake-length-25")]
    SnakeLength25,
    MinesweeperFlawless,
    TypingPerfect,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something a session wants its owner to forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Stats(StatsRecord),
    Leaderboard(LeaderboardCandidate),
    Achievement { id: AchievementId },
}
