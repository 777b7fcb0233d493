//! Mini-game state machines for Playfield.
//!
//! Each game is a self-contained session that owns its
//! [`SeededRandom`](playfield_random::SeededRandom) and moves through the
//! same lifecycle:
//!
//! ```text
//! Idle ──start──→ Playing ⇄ Paused
//!                    │
//!                    ├──→ Won
//!                    └──→ Lost
//! ```
//!
//! # Key types
//!
//! - [`GameSession`]: the trait every game implements (and the tick
//!   driver is generic over)
//! - [`GameStatus`]: the lifecycle state machine
//! - [`AnyGame`] / [`GameInput`]: one value that can hold any of the five
//!   games, used by battle clients
//! - [`GameEvent`]: records emitted on terminal transitions for the
//!   stats, leaderboard, and achievement collaborators
//!
//! Illegal input is never an error. `apply` returns `false` and the
//! session is left exactly as it was.

mod any;
mod error;
mod grid;
mod kind;
mod lifecycle;
mod report;
mod session;
mod status;
mod undo;

pub mod game2048;
pub mod minesweeper;
pub mod snake;
pub mod tetris;
pub mod typing;

pub use any::{AnyGame, GameInput};
pub use error::GameError;
pub use grid::Direction;
pub use kind::GameKind;
pub use report::{AchievementId, GameEvent, GameStats, LeaderboardCandidate, StatsRecord};
pub use session::{GameSession, SessionView};
pub use status::GameStatus;
pub use undo::UndoRing;

pub use game2048::{Game2048, Game2048Config, Game2048Input};
pub use minesweeper::{Minesweeper, MinesweeperConfig, MinesweeperInput};
pub use snake::{Snake, SnakeConfig, SnakeInput};
pub use tetris::{Tetris, TetrisConfig, TetrisInput, Tetromino};
pub use typing::{Typing, TypingConfig, TypingInput};
