//! Move ordering and desync detection for one match.
//!
//! Both sides build their generator from the match seed, so the state a
//! side reports after `n` draws is fixed before the match starts. The guard
//! computes it with [`SeededRandom::checkpoint_at`] and compares. Any
//! mismatch means the two simulations can no longer be compared fairly.
//!
//! Matching draws do not prove matching boards: a client that consumes the
//! stream in a different order lands on the same state with different
//! pieces. Each report also carries an artifact [`Fingerprint`], and the
//! guard compares the two sides' hashes whenever they reach the same
//! artifact count.

use std::collections::BTreeMap;

use playfield_protocol::PlayerId;
use playfield_random::{Checkpoint, Fingerprint, SeededRandom};
use tracing::{error, trace, warn};

use crate::BattleError;

/// Fingerprints kept per side for comparison with the slower opponent.
const FINGERPRINT_HISTORY: usize = 1024;

#[derive(Debug, Default)]
struct Side {
    last_seq: Option<u64>,
    moves: u64,
    last_checkpoint: Option<Checkpoint>,
    /// Artifact count → hash, oldest evicted first.
    fingerprints: BTreeMap<u64, u64>,
}

/// Per-match ordering and consistency checks.
#[derive(Debug)]
pub struct SyncGuard {
    seed: i64,
    players: [PlayerId; 2],
    sides: [Side; 2],
}

impl SyncGuard {
    pub fn new(seed: i64, players: [PlayerId; 2]) -> Self {
        Self {
            seed,
            players,
            sides: Default::default(),
        }
    }

    fn side_mut(&mut self, player: PlayerId) -> Option<&mut Side> {
        let index = self.players.iter().position(|p| *p == player)?;
        Some(&mut self.sides[index])
    }

    fn side(&self, player: PlayerId) -> Option<&Side> {
        let index = self.players.iter().position(|p| *p == player)?;
        Some(&self.sides[index])
    }

    /// Returns `true` if `seq` is newer than every move `player` has sent.
    /// Stale and duplicate moves are dropped.
    pub fn accept_move(&mut self, player: PlayerId, seq: u64) -> bool {
        let Some(side) = self.side_mut(player) else {
            return false;
        };
        if side.last_seq.is_some_and(|last| seq <= last) {
            warn!(%player, seq, last = side.last_seq, "out-of-order move dropped");
            return false;
        }
        side.last_seq = Some(seq);
        side.moves += 1;
        true
    }

    /// Checks a report: the generator position against the match seed,
    /// then the artifact fingerprint against both sides' earlier reports at
    /// the same count.
    ///
    /// # Errors
    /// [`BattleError::Desync`] if the state differs from the one the seed
    /// produces after the same number of draws.
    /// [`BattleError::ArtifactDesync`] if the hash differs from one already
    /// reported at the same artifact count.
    pub fn verify(
        &mut self,
        player: PlayerId,
        checkpoint: Checkpoint,
        fingerprint: Fingerprint,
    ) -> Result<(), BattleError> {
        let expected = SeededRandom::checkpoint_at(self.seed, checkpoint.draws);
        if expected.state != checkpoint.state {
            error!(
                %player,
                draws = checkpoint.draws,
                expected = expected.state,
                actual = checkpoint.state,
                "generator desync"
            );
            return Err(BattleError::Desync {
                player,
                draws: checkpoint.draws,
                expected: expected.state,
                actual: checkpoint.state,
            });
        }
        self.verify_fingerprint(player, fingerprint)?;

        if let Some(side) = self.side_mut(player) {
            if side
                .last_checkpoint
                .is_some_and(|last| last.draws > checkpoint.draws)
            {
                warn!(%player, draws = checkpoint.draws, "checkpoint older than the last one");
            } else {
                side.last_checkpoint = Some(checkpoint);
            }
        }
        trace!(%player, draws = checkpoint.draws, "checkpoint verified");
        Ok(())
    }

    fn verify_fingerprint(
        &mut self,
        player: PlayerId,
        fingerprint: Fingerprint,
    ) -> Result<(), BattleError> {
        let Some(index) = self.players.iter().position(|p| *p == player) else {
            return Ok(());
        };
        let Fingerprint { count, hash } = fingerprint;
        for side in &self.sides {
            let Some(&expected) = side.fingerprints.get(&count) else {
                continue;
            };
            if expected != hash {
                error!(%player, count, expected, actual = hash, "artifact desync");
                return Err(BattleError::ArtifactDesync {
                    player,
                    count,
                    expected,
                    actual: hash,
                });
            }
        }

        let own = &mut self.sides[index].fingerprints;
        own.insert(count, hash);
        if own.len() > FINGERPRINT_HISTORY {
            own.pop_first();
        }
        Ok(())
    }

    pub fn last_checkpoint(&self, player: PlayerId) -> Option<Checkpoint> {
        self.side(player).and_then(|side| side.last_checkpoint)
    }

    /// Moves accepted from `player` so far.
    pub fn moves(&self, player: PlayerId) -> u64 {
        self.side(player).map_or(0, |side| side.moves)
    }
}
