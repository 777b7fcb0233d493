//! Error types for the battle layer.

use playfield_protocol::{MatchId, PlayerId};

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("match {0} not found")]
    NotFound(MatchId),

    #[error("player {0} not in match {1}")]
    NotInMatch(PlayerId, MatchId),

    #[error("player {0} is not in any match")]
    NoMatch(PlayerId),

    #[error("player {0} is already queued")]
    AlreadyQueued(PlayerId),

    #[error("player {0} is not queued")]
    NotQueued(PlayerId),

    #[error("player {0} already in match {1}")]
    AlreadyInMatch(PlayerId, MatchId),

    /// The match actor has stopped (or its channel is full and closed).
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),

    /// A side's generator is not where the shared seed says it must be.
    /// Always a bug in one of the clients; the match is aborted.
    #[error(
        "desync: {player} reported state {actual} after {draws} draws, expected {expected}"
    )]
    Desync {
        player: PlayerId,
        draws: u64,
        expected: i64,
        actual: i64,
    },

    /// Both sides drew the same values but turned them into different
    /// pieces, tiles, cells, or words.
    #[error("desync: {player} artifact hash {actual:#x} after {count}, expected {expected:#x}")]
    ArtifactDesync {
        player: PlayerId,
        count: u64,
        expected: u64,
        actual: u64,
    },
}
