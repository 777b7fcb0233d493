//! Matchmaker: pairs queued players, creates matches, routes traffic.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use playfield_games::GameKind;
use playfield_protocol::{BattleMessage, MatchId, PlayerId};
use playfield_random::MODULUS;
use rand::Rng;
use tracing::{debug, info};

use crate::battle::{MatchSetup, spawn_match};
use crate::{BattleError, MatchConfig, MatchHandle, MatchInfo, PlayerSender};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// What [`Matchmaker::find_match`] did with the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResult {
    /// Waiting for an opponent.
    Queued,
    /// Paired; `MatchStarted` is on its way to both players.
    Matched(MatchId),
}

struct Waiting {
    player_id: PlayerId,
    sender: PlayerSender,
}

/// Tracks queues and running matches.
///
/// A player is in at most one place at a time: one queue or one match.
pub struct Matchmaker {
    config: MatchConfig,
    queues: HashMap<GameKind, VecDeque<Waiting>>,
    matches: HashMap<MatchId, MatchHandle>,
    player_matches: HashMap<PlayerId, MatchId>,
}

impl Matchmaker {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            queues: HashMap::new(),
            matches: HashMap::new(),
            player_matches: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Queues `player_id` for `game`, or pairs them with the player who has
    /// waited longest.
    pub fn find_match(
        &mut self,
        player_id: PlayerId,
        game: GameKind,
        sender: PlayerSender,
    ) -> Result<FindResult, BattleError> {
        self.reap();
        if let Some(match_id) = self.player_matches.get(&player_id) {
            return Err(BattleError::AlreadyInMatch(player_id, *match_id));
        }
        if self.is_queued(player_id) {
            return Err(BattleError::AlreadyQueued(player_id));
        }

        let queue = self.queues.entry(game).or_default();
        // Players whose connection dropped while queued.
        queue.retain(|w| !w.sender.is_closed());

        match queue.pop_front() {
            Some(opponent) => {
                let challenger = Waiting { player_id, sender };
                let match_id = self.start_match(game, opponent, challenger);
                Ok(FindResult::Matched(match_id))
            }
            None => {
                queue.push_back(Waiting { player_id, sender });
                debug!(%player_id, %game, "player queued");
                Ok(FindResult::Queued)
            }
        }
    }

    fn start_match(&mut self, game: GameKind, first: Waiting, second: Waiting) -> MatchId {
        let match_id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
        let seed = rand::rng().random_range(1..MODULUS);
        let players = [first.player_id, second.player_id];

        let handle = spawn_match(
            MatchSetup {
                match_id,
                game,
                seed,
                players: [
                    (first.player_id, first.sender),
                    (second.player_id, second.sender),
                ],
            },
            &self.config,
        );
        self.matches.insert(match_id, handle);
        for player in players {
            self.player_matches.insert(player, match_id);
        }
        info!(%match_id, %game, seed, a = %players[0], b = %players[1], "match created");
        match_id
    }

    /// Takes `player_id` out of whatever queue they are in.
    pub fn cancel_find(&mut self, player_id: PlayerId) -> Result<(), BattleError> {
        for queue in self.queues.values_mut() {
            if let Some(pos) = queue.iter().position(|w| w.player_id == player_id) {
                queue.remove(pos);
                debug!(%player_id, "left queue");
                return Ok(());
            }
        }
        Err(BattleError::NotQueued(player_id))
    }

    /// Routes a battle message to the player's current match.
    pub async fn route(
        &mut self,
        player_id: PlayerId,
        msg: BattleMessage,
    ) -> Result<(), BattleError> {
        self.reap();
        let handle = self.handle_for(player_id)?;
        handle.send_battle(player_id, msg).await
    }

    /// The handle of the match `player_id` is playing, for callers that
    /// want to talk to the actor without holding the matchmaker.
    pub fn match_handle(&mut self, player_id: PlayerId) -> Result<MatchHandle, BattleError> {
        self.reap();
        self.handle_for(player_id)
    }

    /// Removes a player from the queue or their match (forfeiting it).
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<(), BattleError> {
        if self.cancel_find(player_id).is_ok() {
            return Ok(());
        }
        let handle = self.handle_for(player_id)?;
        self.player_matches.remove(&player_id);
        match handle.leave(player_id).await {
            // Already over: leaving is a no-op.
            Err(BattleError::Unavailable(_)) => Ok(()),
            other => other,
        }
    }

    fn handle_for(&self, player_id: PlayerId) -> Result<MatchHandle, BattleError> {
        let match_id = self
            .player_matches
            .get(&player_id)
            .ok_or(BattleError::NoMatch(player_id))?;
        self.matches
            .get(match_id)
            .cloned()
            .ok_or(BattleError::NotFound(*match_id))
    }

    /// Forgets matches whose actor has stopped.
    pub fn reap(&mut self) {
        let before = self.matches.len();
        self.matches.retain(|_, handle| !handle.is_closed());
        let matches = &self.matches;
        self.player_matches.retain(|_, id| matches.contains_key(id));
        let reaped = before - self.matches.len();
        if reaped > 0 {
            debug!(reaped, "finished matches removed");
        }
    }

    pub async fn match_info(&self, match_id: MatchId) -> Result<MatchInfo, BattleError> {
        let handle = self
            .matches
            .get(&match_id)
            .ok_or(BattleError::NotFound(match_id))?;
        handle.get_info().await
    }

    /// Aborts every running match.
    pub async fn shutdown(&mut self) {
        for (match_id, handle) in self.matches.drain() {
            let _ = handle.shutdown().await;
            info!(%match_id, "match shut down");
        }
        self.player_matches.clear();
        self.queues.clear();
    }

    pub fn match_of(&self, player_id: PlayerId) -> Option<MatchId> {
        self.player_matches.get(&player_id).copied()
    }

    pub fn is_queued(&self, player_id: PlayerId) -> bool {
        self.queues
            .values()
            .any(|queue| queue.iter().any(|w| w.player_id == player_id))
    }

    /// Number of players waiting for `game`.
    pub fn queued(&self, game: GameKind) -> usize {
        self.queues.get(&game).map_or(0, VecDeque::len)
    }

    /// Running matches (including ones that finished since the last reap).
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
