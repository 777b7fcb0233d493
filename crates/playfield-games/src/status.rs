//! The session lifecycle state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a game session.
///
/// ```text
/// Idle → Playing ⇄ Paused
///           │
///           ├→ Won
///           └→ Lost
/// ```
///
/// - **Idle**: created, seed known, nothing drawn yet.
/// - **Playing**: the only state in which the board may change.
/// - **Paused**: the clock is frozen; input and ticks are ignored.
/// - **Won** / **Lost**: terminal. A new game is a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Idle,
    Playing,
    Paused,
    Won,
    Lost,
}

impl GameStatus {
    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Playing)
                | (Self::Playing, Self::Paused)
                | (Self::Paused, Self::Playing)
                | (Self::Playing, Self::Won)
                | (Self::Playing, Self::Lost)
        )
    }

    /// Returns `true` for `Won` and `Lost`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
            Self::Won => write!(f, "Won"),
            Self::Lost => write!(f, "Lost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GameStatus; 5] = [
        GameStatus::Idle,
        GameStatus::Playing,
        GameStatus::Paused,
        GameStatus::Won,
        GameStatus::Lost,
    ];

    #[test]
    fn test_allowed_transitions() {
        assert!(GameStatus::Idle.can_transition_to(GameStatus::Playing));
        assert!(GameStatus::Playing.can_transition_to(GameStatus::Paused));
        assert!(GameStatus::Paused.can_transition_to(GameStatus::Playing));
        assert!(GameStatus::Playing.can_transition_to(GameStatus::Won));
        assert!(GameStatus::Playing.can_transition_to(GameStatus::Lost));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for target in ALL {
            assert!(!GameStatus::Won.can_transition_to(target));
            assert!(!GameStatus::Lost.can_transition_to(target));
        }
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!GameStatus::Idle.can_transition_to(GameStatus::Won));
        assert!(!GameStatus::Idle.can_transition_to(GameStatus::Paused));
        assert!(!GameStatus::Paused.can_transition_to(GameStatus::Lost));
        assert!(!GameStatus::Playing.can_transition_to(GameStatus::Idle));
    }

    #[test]
    fn test_is_terminal() {
        assert!(GameStatus::Won.is_terminal());
        assert!(GameStatus::Lost.is_terminal());
        assert!(!GameStatus::Paused.is_terminal());
    }
}
