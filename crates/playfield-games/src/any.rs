//! One type for "some game", for code that picks the game at runtime.

use std::time::Duration;

use playfield_random::{Checkpoint, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::{
    Game2048, Game2048Config, Game2048Input, GameError, GameEvent, GameKind, GameSession,
    GameStats, GameStatus, Minesweeper, MinesweeperConfig, MinesweeperInput, Snake, SnakeConfig,
    SnakeInput, Tetris, TetrisConfig, TetrisInput, Typing, TypingConfig, TypingInput,
};

/// Input for any of the five games.
///
/// Serialized as `{"game": "tetris", "input": "hard_drop"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", content = "input", rename_all = "snake_case")]
pub enum GameInput {
    Tetris(TetrisInput),
    #[serde(rename = "2048")]
    Game2048(Game2048Input),
    Snake(SnakeInput),
    Minesweeper(MinesweeperInput),
    Typing(TypingInput),
}

impl GameInput {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Tetris(_) => GameKind::Tetris,
            Self::Game2048(_) => GameKind::Game2048,
            Self::Snake(_) => GameKind::Snake,
            Self::Minesweeper(_) => GameKind::Minesweeper,
            Self::Typing(_) => GameKind::Typing,
        }
    }
}

/// Runs `$body` with `$g` bound to the session inside `$game`.
macro_rules! each_game {
    ($game:expr, $g:ident => $body:expr) => {
        match $game {
            AnyGame::Tetris($g) => $body,
            AnyGame::Game2048($g) => $body,
            AnyGame::Snake($g) => $body,
            AnyGame::Minesweeper($g) => $body,
            AnyGame::Typing($g) => $body,
        }
    };
}

/// Any one of the five game sessions.
#[derive(Debug, Clone)]
pub enum AnyGame {
    Tetris(Tetris),
    Game2048(Game2048),
    Snake(Snake),
    Minesweeper(Minesweeper),
    Typing(Typing),
}

impl AnyGame {
    /// Creates a session of `kind` with its default config.
    pub fn new(kind: GameKind, seed: i64) -> Result<Self, GameError> {
        Ok(match kind {
            GameKind::Tetris => Self::Tetris(Tetris::new(TetrisConfig::default(), seed)?),
            GameKind::Game2048 => Self::Game2048(Game2048::new(Game2048Config::default(), seed)?),
            GameKind::Snake => Self::Snake(Snake::new(SnakeConfig::default(), seed)?),
            GameKind::Minesweeper => {
                Self::Minesweeper(Minesweeper::new(MinesweeperConfig::default(), seed)?)
            }
            GameKind::Typing => Self::Typing(Typing::new(TypingConfig::default(), seed)?),
        })
    }
}

impl GameSession for AnyGame {
    type Input = GameInput;

    fn kind(&self) -> GameKind {
        each_game!(self, g => g.kind())
    }

    fn status(&self) -> GameStatus {
        each_game!(self, g => g.status())
    }

    fn start(&mut self) -> bool {
        each_game!(self, g => g.start())
    }

    fn pause(&mut self) -> bool {
        each_game!(self, g => g.pause())
    }

    fn resume(&mut self) -> bool {
        each_game!(self, g => g.resume())
    }

    /// Input for a different game than the one held is ignored.
    fn apply(&mut self, input: GameInput) -> bool {
        match (self, input) {
            (Self::Tetris(g), GameInput::Tetris(i)) => g.apply(i),
            (Self::Game2048(g), GameInput::Game2048(i)) => g.apply(i),
            (Self::Snake(g), GameInput::Snake(i)) => g.apply(i),
            (Self::Minesweeper(g), GameInput::Minesweeper(i)) => g.apply(i),
            (Self::Typing(g), GameInput::Typing(i)) => g.apply(i),
            (game, input) => {
                tracing::debug!(
                    game = %GameSession::kind(game),
                    input = %input.kind(),
                    "input for another game"
                );
                false
            }
        }
    }

    fn tick(&mut self, dt: Duration) -> bool {
        each_game!(self, g => g.tick(dt))
    }

    fn score(&self) -> u64 {
        each_game!(self, g => g.score())
    }

    fn elapsed(&self) -> Duration {
        each_game!(self, g => g.elapsed())
    }

    fn rng_checkpoint(&self) -> Checkpoint {
        each_game!(self, g => g.rng_checkpoint())
    }

    fn fingerprint(&self) -> Fingerprint {
        each_game!(self, g => g.fingerprint())
    }

    fn stats(&self) -> GameStats {
        each_game!(self, g => g.stats())
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        each_game!(self, g => g.drain_events())
    }
}
