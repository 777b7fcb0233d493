//! Identifies which mini-game a session, record, or match is about.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five mini-games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Tetris,
    #[serde(rename = "2048")]
    Game2048,
    Snake,
    Minesweeper,
    Typing,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Tetris,
        GameKind::Game2048,
        GameKind::Snake,
        GameKind::Minesweeper,
        GameKind::Typing,
    ];
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tetris => write!(f, "tetris"),
            Self::Game2048 => write!(f, "2048"),
            Self::Snake => write!(f, "snake"),
            Self::Minesweeper => write!(f, "minesweeper"),
            Self::Typing => write!(f, "typing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_wire_name() {
        for kind in GameKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
