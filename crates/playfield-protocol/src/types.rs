//! Every type that travels on the wire between battle clients and the relay.

use std::fmt;

use playfield_games::{GameInput, GameKind, GameStats, GameStatus, SessionView};
use playfield_random::{Checkpoint, Fingerprint, MODULUS};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Bumped whenever a message changes shape.
pub const PROTOCOL_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A connected player. Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// One battle between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Arbitration
// ---------------------------------------------------------------------------

/// How a match between two players of the same game is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrationMode {
    /// Last one standing. Topping out loses on the spot.
    Survival,
    /// First to clear the board or passage wins.
    Race,
    /// Both play to the end; the higher score wins.
    HighScore,
}

impl ArbitrationMode {
    pub fn for_game(kind: GameKind) -> Self {
        match kind {
            GameKind::Tetris => Self::Survival,
            GameKind::Minesweeper | GameKind::Typing => Self::Race,
            GameKind::Game2048 | GameKind::Snake => Self::HighScore,
        }
    }
}

impl fmt::Display for ArbitrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Survival => write!(f, "survival"),
            Self::Race => write!(f, "race"),
            Self::HighScore => write!(f, "high_score"),
        }
    }
}

/// How a match ended.
///
/// ```text
/// { "result": "Winner", "detail": 7 }
/// { "result": "Draw" }
/// { "result": "Aborted", "detail": "desync at draw 12" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail")]
pub enum MatchOutcome {
    Winner(PlayerId),
    Draw,
    /// The match could not be decided fairly (desync, relay shutdown).
    Aborted(String),
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            Self::Winner(player) => Some(*player),
            _ => None,
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner(player) => write!(f, "{player} wins"),
            Self::Draw => write!(f, "draw"),
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress reports
// ---------------------------------------------------------------------------

/// A running summary of one side's session.
///
/// Carries the generator checkpoint and the artifact fingerprint so the
/// relay can compare both sides' streams and what they produced without
/// ever seeing a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: GameStatus,
    pub score: u64,
    pub elapsed_ms: u64,
    pub checkpoint: Checkpoint,
    pub fingerprint: Fingerprint,
}

impl From<SessionView> for Progress {
    fn from(view: SessionView) -> Self {
        Self {
            status: view.status,
            score: view.score,
            elapsed_ms: view.elapsed_ms,
            checkpoint: view.checkpoint,
            fingerprint: view.fingerprint,
        }
    }
}

/// Sent once, when a side's session reaches `Won` or `Lost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub status: GameStatus,
    pub score: u64,
    pub elapsed_ms: u64,
    pub checkpoint: Checkpoint,
    pub fingerprint: Fingerprint,
    pub stats: GameStats,
}

impl FinalReport {
    pub fn new(view: SessionView, stats: GameStats) -> Self {
        Self {
            status: view.status,
            score: view.score,
            elapsed_ms: view.elapsed_ms,
            checkpoint: view.checkpoint,
            fingerprint: view.fingerprint,
            stats,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            status: self.status,
            score: self.score,
            elapsed_ms: self.elapsed_ms,
            checkpoint: self.checkpoint,
            fingerprint: self.fingerprint,
        }
    }
}

// ---------------------------------------------------------------------------
// SystemMessage
// ---------------------------------------------------------------------------

/// Connection, matchmaking, and keep-alive plumbing.
///
/// Internally tagged: `{ "type": "FindMatch", "game": "tetris" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → relay, first message on a connection.
    Handshake { version: u32, token: Option<String> },

    /// Relay → client.
    HandshakeAck { player_id: PlayerId, server_time: u64 },

    /// Either direction.
    Disconnect { reason: String },

    // -- Heartbeat --
    Heartbeat { client_time: u64 },

    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Matchmaking --
    /// Client → relay: queue for a battle of `game`.
    FindMatch { game: GameKind },

    /// Client → relay: leave the queue.
    CancelFind,

    /// Relay → client: waiting for an opponent.
    Queued { game: GameKind },

    /// Relay → both players, before any relayed traffic. Both sides build
    /// their session from `seed`.
    MatchStarted {
        match_id: MatchId,
        game: GameKind,
        seed: i64,
        opponent: PlayerId,
        mode: ArbitrationMode,
        time_limit_ms: u64,
    },

    // -- Errors --
    /// HTTP-style `code` (400 bad request, 401 unauthorized, 409 conflict).
    Error { code: u16, message: String },
}

impl SystemMessage {
    /// Checks the rules serde cannot express.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] for an unsupported handshake
    /// version or a match seed the generator would not accept as-is.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Handshake { version, .. } if *version == 0 || *version > PROTOCOL_VERSION => {
                Err(ProtocolError::InvalidMessage(format!(
                    "unsupported protocol version {version}"
                )))
            }
            Self::MatchStarted { seed, .. } if !(1..MODULUS).contains(seed) => Err(
                ProtocolError::InvalidMessage(format!("match seed {seed} out of range")),
            ),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Battle / relay traffic
// ---------------------------------------------------------------------------

/// Client → relay during a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleMessage {
    /// One applied input. `seq` increases strictly per player.
    Move { seq: u64, input: GameInput },
    Progress(Progress),
    Finished(FinalReport),
}

/// Relay → client during a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayEvent {
    OpponentMove { seq: u64, input: GameInput },
    OpponentProgress(Progress),
    OpponentFinished(FinalReport),
    /// Last message of a match.
    MatchResult { outcome: MatchOutcome },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// `{ "type": "Battle", "data": { "type": "Move", ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Battle(BattleMessage),
    Relay(RelayEvent),
}

/// The top-level message. Every frame on the socket is one envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender counter.
    pub seq: u64,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shapes here are what browser clients parse, so they are
    //! checked field by field.

    use playfield_games::{Direction, SnakeInput, TetrisInput};

    use super::*;

    fn checkpoint() -> Checkpoint {
        Checkpoint {
            draws: 12,
            state: 98_765,
        }
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&MatchId(7)).unwrap(), "7");
        assert_eq!(PlayerId(42).to_string(), "P-42");
        assert_eq!(MatchId(7).to_string(), "M-7");
    }

    #[test]
    fn test_arbitration_mode_per_game() {
        assert_eq!(ArbitrationMode::for_game(GameKind::Tetris), ArbitrationMode::Survival);
        assert_eq!(ArbitrationMode::for_game(GameKind::Typing), ArbitrationMode::Race);
        assert_eq!(ArbitrationMode::for_game(GameKind::Minesweeper), ArbitrationMode::Race);
        assert_eq!(ArbitrationMode::for_game(GameKind::Snake), ArbitrationMode::HighScore);
        assert_eq!(ArbitrationMode::for_game(GameKind::Game2048), ArbitrationMode::HighScore);
    }

    #[test]
    fn test_match_started_json_format() {
        let msg = SystemMessage::MatchStarted {
            match_id: MatchId(3),
            game: GameKind::Game2048,
            seed: 555,
            opponent: PlayerId(9),
            mode: ArbitrationMode::HighScore,
            time_limit_ms: 180_000,
        };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "MatchStarted");
        assert_eq!(json["match_id"], 3);
        assert_eq!(json["game"], "2048");
        assert_eq!(json["seed"], 555);
        assert_eq!(json["opponent"], 9);
        assert_eq!(json["mode"], "high_score");
    }

    #[test]
    fn test_find_match_json_format() {
        let json = serde_json::to_value(SystemMessage::FindMatch {
            game: GameKind::Minesweeper,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "FindMatch", "game": "minesweeper"}));
    }

    #[test]
    fn test_handshake_without_token() {
        let msg = SystemMessage::Handshake {
            version: 1,
            token: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Handshake");
        assert!(json["token"].is_null());
    }

    #[test]
    fn test_validate_rejects_bad_version() {
        let zero = SystemMessage::Handshake {
            version: 0,
            token: None,
        };
        let future = SystemMessage::Handshake {
            version: PROTOCOL_VERSION + 1,
            token: None,
        };
        assert!(matches!(zero.validate(), Err(ProtocolError::InvalidMessage(_))));
        assert!(future.validate().is_err());
        assert!(SystemMessage::Handshake {
            version: PROTOCOL_VERSION,
            token: None
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_seed() {
        let started = |seed| SystemMessage::MatchStarted {
            match_id: MatchId(1),
            game: GameKind::Tetris,
            seed,
            opponent: PlayerId(2),
            mode: ArbitrationMode::Survival,
            time_limit_ms: 0,
        };
        assert!(started(0).validate().is_err());
        assert!(started(MODULUS).validate().is_err());
        assert!(started(1).validate().is_ok());
        assert!(started(MODULUS - 1).validate().is_ok());
    }

    #[test]
    fn test_move_carries_tagged_input() {
        let msg = BattleMessage::Move {
            seq: 4,
            input: GameInput::Snake(SnakeInput::Turn(Direction::Up)),
        };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Move");
        assert_eq!(json["seq"], 4);
        assert_eq!(json["input"]["game"], "snake");
    }

    #[test]
    fn test_progress_is_flattened_into_tag() {
        let msg = BattleMessage::Progress(Progress {
            status: GameStatus::Playing,
            score: 120,
            elapsed_ms: 3_000,
            checkpoint: checkpoint(),
            fingerprint: Fingerprint { count: 4, hash: 77 },
        });
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Progress");
        assert_eq!(json["status"], "playing");
        assert_eq!(json["checkpoint"]["draws"], 12);
        assert_eq!(json["fingerprint"]["count"], 4);
    }

    #[test]
    fn test_finished_round_trip() {
        let report = FinalReport {
            status: GameStatus::Lost,
            score: 40,
            elapsed_ms: 9_000,
            checkpoint: checkpoint(),
            fingerprint: Fingerprint::default(),
            stats: GameStats::Snake {
                score: 40,
                length: 7,
            },
        };
        let msg = BattleMessage::Finished(report.clone());
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: BattleMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(report.progress().score, 40);
    }

    #[test]
    fn test_match_outcome_json_format() {
        let winner = serde_json::to_value(MatchOutcome::Winner(PlayerId(5))).unwrap();
        assert_eq!(winner, serde_json::json!({"result": "Winner", "detail": 5}));

        let draw = serde_json::to_value(MatchOutcome::Draw).unwrap();
        assert_eq!(draw, serde_json::json!({"result": "Draw"}));

        assert_eq!(MatchOutcome::Winner(PlayerId(5)).winner(), Some(PlayerId(5)));
        assert_eq!(MatchOutcome::Aborted("x".into()).winner(), None);
    }

    #[test]
    fn test_payload_battle_json_format() {
        let payload = Payload::Battle(BattleMessage::Move {
            seq: 1,
            input: GameInput::Tetris(TetrisInput::HardDrop),
        });
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "Battle");
        assert_eq!(json["data"]["type"], "Move");
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope {
            seq: 42,
            timestamp: 15_000,
            payload: Payload::Relay(RelayEvent::MatchResult {
                outcome: MatchOutcome::Aborted("desync".into()),
            }),
        };
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_decode_unknown_message_type_returns_error() {
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        assert!(serde_json::from_str::<SystemMessage>(unknown).is_err());
        assert!(serde_json::from_str::<BattleMessage>(unknown).is_err());
    }
}
