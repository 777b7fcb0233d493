//! Match actor: one Tokio task per battle.
//!
//! The actor owns the match's [`SyncGuard`] and [`Arbiter`] and talks to
//! the outside world only through channels. It never runs a game; each
//! player's client does that from the shared seed.
//!
//! ```text
//!  conn A ──MatchCommand──→ ┌── match actor ──┐ ──Payload──→ conn A
//!  conn B ──MatchCommand──→ │ guard · arbiter │ ──Payload──→ conn B
//!                           └─────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use playfield_games::GameKind;
use playfield_protocol::{
    ArbitrationMode, BattleMessage, MatchId, MatchOutcome, Payload, PlayerId, RelayEvent,
    SystemMessage,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{Arbiter, BattleError, MatchConfig, MatchState, SyncGuard};

/// Channel for delivering outbound payloads to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<Payload>;

pub(crate) enum MatchCommand {
    /// A battle message from one of the players.
    Battle { sender: PlayerId, msg: BattleMessage },

    /// The player left (disconnect, explicit leave). Forfeits the match.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), BattleError>>,
    },

    GetInfo { reply: oneshot::Sender<MatchInfo> },

    Shutdown,
}

/// A snapshot of match metadata.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub game: GameKind,
    pub seed: i64,
    pub mode: ArbitrationMode,
    pub state: MatchState,
    pub players: [PlayerId; 2],
}

/// Everything needed to start a match.
pub struct MatchSetup {
    pub match_id: MatchId,
    pub game: GameKind,
    pub seed: i64,
    pub players: [(PlayerId, PlayerSender); 2],
}

/// Handle to a running match actor. Cheap to clone.
#[derive(Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Forwards a player's battle message (fire-and-forget).
    pub async fn send_battle(
        &self,
        sender: PlayerId,
        msg: BattleMessage,
    ) -> Result<(), BattleError> {
        self.sender
            .send(MatchCommand::Battle { sender, msg })
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))
    }

    /// Removes a player, which ends the match in the opponent's favour.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), BattleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))?
    }

    pub async fn get_info(&self) -> Result<MatchInfo, BattleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))
    }

    /// Ends the match as aborted.
    pub async fn shutdown(&self) -> Result<(), BattleError> {
        self.sender
            .send(MatchCommand::Shutdown)
            .await
            .map_err(|_| BattleError::Unavailable(self.match_id))
    }
}

struct MatchActor {
    match_id: MatchId,
    game: GameKind,
    seed: i64,
    state: MatchState,
    time_limit: Duration,
    players: [PlayerId; 2],
    senders: [PlayerSender; 2],
    guard: SyncGuard,
    arbiter: Arbiter,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    async fn run(mut self) {
        info!(
            match_id = %self.match_id,
            game = %self.game,
            seed = self.seed,
            "match actor started"
        );
        self.announce();

        let deadline = (!self.time_limit.is_zero()).then(|| Instant::now() + self.time_limit);

        let outcome = loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(MatchCommand::Battle { sender, msg }) => {
                        if let Some(outcome) = self.handle_battle(sender, msg) {
                            break outcome;
                        }
                    }
                    Some(MatchCommand::Leave { player_id, reply }) => {
                        if !self.players.contains(&player_id) {
                            let err = BattleError::NotInMatch(player_id, self.match_id);
                            let _ = reply.send(Err(err));
                            continue;
                        }
                        info!(match_id = %self.match_id, %player_id, "player left, forfeit");
                        let _ = reply.send(Ok(()));
                        break self.arbiter.forfeit(player_id);
                    }
                    Some(MatchCommand::GetInfo { reply }) => {
                        let _ = reply.send(self.info());
                    }
                    Some(MatchCommand::Shutdown) | None => {
                        break MatchOutcome::Aborted("match shut down".into());
                    }
                },
                () = until(deadline) => {
                    info!(match_id = %self.match_id, "time limit reached");
                    break self.arbiter.time_up();
                }
            }
        };

        self.finish(outcome);
    }

    /// Sends `MatchStarted` to both players. Nothing else reaches a player
    /// before this.
    fn announce(&mut self) {
        for (i, player) in self.players.iter().enumerate() {
            let msg = SystemMessage::MatchStarted {
                match_id: self.match_id,
                game: self.game,
                seed: self.seed,
                opponent: self.players[1 - i],
                mode: self.arbiter.mode(),
                time_limit_ms: self.time_limit.as_millis() as u64,
            };
            debug!(match_id = %self.match_id, %player, "sending MatchStarted");
            let _ = self.senders[i].send(Payload::System(msg));
        }
        self.state = MatchState::InProgress;
    }

    fn handle_battle(&mut self, sender: PlayerId, msg: BattleMessage) -> Option<MatchOutcome> {
        let Some(i) = self.players.iter().position(|p| *p == sender) else {
            warn!(match_id = %self.match_id, %sender, "message from non-member, ignoring");
            return None;
        };
        let opponent = 1 - i;

        match msg {
            BattleMessage::Move { seq, input } => {
                if input.kind() != self.game {
                    debug!(
                        match_id = %self.match_id,
                        %sender,
                        game = %input.kind(),
                        "move for another game dropped"
                    );
                    return None;
                }
                if self.guard.accept_move(sender, seq) {
                    self.send_to(opponent, RelayEvent::OpponentMove { seq, input });
                }
                None
            }
            BattleMessage::Progress(progress) => {
                let verified = self
                    .guard
                    .verify(sender, progress.checkpoint, progress.fingerprint);
                if let Err(err) = verified {
                    return Some(MatchOutcome::Aborted(err.to_string()));
                }
                self.arbiter.record_progress(sender, progress);
                self.send_to(opponent, RelayEvent::OpponentProgress(progress));
                None
            }
            BattleMessage::Finished(report) => {
                let verified = self
                    .guard
                    .verify(sender, report.checkpoint, report.fingerprint);
                if let Err(err) = verified {
                    return Some(MatchOutcome::Aborted(err.to_string()));
                }
                let outcome = self.arbiter.record_finish(sender, &report);
                self.send_to(opponent, RelayEvent::OpponentFinished(report));
                outcome
            }
        }
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        // Closing first means `MatchHandle::is_closed` is already true by
        // the time a player sees the result.
        self.receiver.close();
        self.state = MatchState::Finished;
        info!(
            match_id = %self.match_id,
            %outcome,
            moves_a = self.guard.moves(self.players[0]),
            moves_b = self.guard.moves(self.players[1]),
            "match finished"
        );
        for i in 0..2 {
            self.send_to(i, RelayEvent::MatchResult {
                outcome: outcome.clone(),
            });
        }
    }

    /// Silently drops the event if the player's connection is gone.
    fn send_to(&self, index: usize, event: RelayEvent) {
        let _ = self.senders[index].send(Payload::Relay(event));
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            match_id: self.match_id,
            game: self.game,
            seed: self.seed,
            mode: self.arbiter.mode(),
            state: self.state,
            players: self.players,
        }
    }
}

fn until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}

/// Spawns a match actor and returns a handle to it.
pub(crate) fn spawn_match(setup: MatchSetup, config: &MatchConfig) -> MatchHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let [(a, a_tx), (b, b_tx)] = setup.players;
    let players = [a, b];
    let mode = ArbitrationMode::for_game(setup.game);

    let actor = MatchActor {
        match_id: setup.match_id,
        game: setup.game,
        seed: setup.seed,
        state: MatchState::Starting,
        time_limit: config.time_limit,
        players,
        senders: [a_tx, b_tx],
        guard: SyncGuard::new(setup.seed, players),
        arbiter: Arbiter::new(mode, players),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        match_id: setup.match_id,
        sender: tx,
    }
}
