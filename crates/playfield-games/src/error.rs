//! Error types for the game layer.

use playfield_random::RandomError;

/// Errors that can occur while creating a game session.
///
/// Gameplay itself never fails: illegal moves are no-ops. Errors only
/// come from configurations that could never be played.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The configuration is unplayable (empty board, too many mines, ...).
    #[error("invalid game config: {0}")]
    InvalidConfig(String),

    /// The randomness layer rejected an argument.
    #[error(transparent)]
    Random(#[from] RandomError),
}
