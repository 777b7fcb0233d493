//! Per-connection handler: handshake, presence, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Handshake`, check the version, authenticate the token
//!   2. Claim the player's presence and send `HandshakeAck`
//!   3. Loop: client envelopes go to the matchmaker or the player's match;
//!      payloads from the match actor are written back to the client

use std::sync::Arc;

use playfield_battle::{BattleError, FindResult, MatchHandle, PlayerSender};
use playfield_protocol::{
    BattleMessage, Codec, Envelope, JsonCodec, Payload, PlayerId, ProtocolError, SystemMessage,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::server::RelayState;
use crate::transport::WebSocketConnection;
use crate::{AuthError, Authenticator, RelayError};

/// Drop guard that takes the player out of matchmaking and forgets their
/// presence when the handler exits, panics included.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct PresenceGuard<A: Authenticator> {
    player_id: PlayerId,
    state: Arc<RelayState<A>>,
}

impl<A: Authenticator> Drop for PresenceGuard<A> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            // Leave first, so a quick reconnect never finds the old match.
            if let Err(e) = state.matchmaker.lock().await.leave(player_id).await {
                tracing::debug!(%player_id, error = %e, "nothing to leave");
            }
            state.online.lock().await.remove(&player_id);
        });
    }
}

/// Writes envelopes to one client with its own sequence counter.
struct Outbox<'a> {
    conn: &'a WebSocketConnection,
    codec: &'a JsonCodec,
    seq: u64,
    start: Instant,
}

impl Outbox<'_> {
    async fn send(&mut self, payload: Payload) -> Result<(), RelayError> {
        let envelope = Envelope {
            seq: next_seq(&mut self.seq),
            timestamp: self.elapsed_ms(),
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), RelayError> {
        self.send(Payload::System(msg)).await
    }

    /// Sends a `SystemMessage::Error` to the client.
    async fn error(&mut self, code: u16, message: impl Into<String>) -> Result<(), RelayError> {
        self.system(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    conn: WebSocketConnection,
    state: Arc<RelayState<A>>,
) -> Result<(), RelayError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut outbox = Outbox {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
        start: Instant::now(),
    };

    // --- Handshake ---
    let player_id = perform_handshake(&conn, &state, &mut outbox).await?;

    if !state.online.lock().await.insert(player_id) {
        outbox.error(409, "already connected").await?;
        return Err(AuthError::AlreadyConnected(player_id).into());
    }
    let _guard = PresenceGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let server_time = outbox.elapsed_ms();
    outbox
        .system(SystemMessage::HandshakeAck {
            player_id,
            server_time,
        })
        .await?;
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Message loop ---
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let mut client = Client {
        player_id,
        state: &state,
        outbound_tx,
        current_match: None,
    };
    let idle_timeout = state.config.idle_timeout;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                last_seen = Instant::now();
                if client.handle_frame(&data, &mut outbox).await? {
                    break;
                }
            }
            Some(payload) = outbound_rx.recv() => {
                outbox.send(payload).await?;
            }
            () = tokio::time::sleep_until(last_seen + idle_timeout) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%player_id, error = %e, "close failed");
    }
    // _guard drops here and the player leaves matchmaking.
    Ok(())
}

/// Receives `Handshake`, validates it, and authenticates the token.
async fn perform_handshake<A: Authenticator>(
    conn: &WebSocketConnection,
    state: &RelayState<A>,
    outbox: &mut Outbox<'_>,
) -> Result<PlayerId, RelayError> {
    let data = match tokio::time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            let reason = "connection closed before handshake";
            return Err(ProtocolError::InvalidMessage(reason.into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = match state.codec.decode(&data) {
        Ok(envelope) => envelope,
        Err(e) => {
            outbox.error(400, "expected Handshake").await?;
            return Err(e.into());
        }
    };

    let Payload::System(msg) = envelope.payload else {
        outbox.error(400, "expected Handshake").await?;
        return Err(not_a_handshake());
    };
    if let Err(e) = msg.validate() {
        outbox.error(400, e.to_string()).await?;
        return Err(e.into());
    }
    let SystemMessage::Handshake { token, .. } = msg else {
        outbox.error(400, "expected Handshake").await?;
        return Err(not_a_handshake());
    };

    match state.auth.authenticate(token.as_deref().unwrap_or("")).await {
        Ok(player_id) => Ok(player_id),
        Err(e) => {
            outbox.error(401, "unauthorized").await?;
            Err(e.into())
        }
    }
}

fn not_a_handshake() -> RelayError {
    ProtocolError::InvalidMessage("first message must be Handshake".into()).into()
}

/// Per-connection routing state after the handshake.
struct Client<'a, A: Authenticator> {
    player_id: PlayerId,
    state: &'a RelayState<A>,
    /// Handed to the matchmaker; the match actor writes relay events here.
    outbound_tx: PlayerSender,
    /// Cached so battle traffic does not take the matchmaker lock.
    current_match: Option<MatchHandle>,
}

impl<A: Authenticator> Client<'_, A> {
    /// Handles one inbound frame. Returns `true` if the connection should
    /// close.
    async fn handle_frame(
        &mut self,
        data: &[u8],
        outbox: &mut Outbox<'_>,
    ) -> Result<bool, RelayError> {
        let envelope: Envelope = match self.state.codec.decode(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    player_id = %self.player_id,
                    error = %e,
                    "failed to decode envelope"
                );
                outbox.error(400, format!("invalid envelope: {e}")).await?;
                return Ok(false);
            }
        };

        match envelope.payload {
            Payload::System(msg) => self.handle_system(msg, outbox).await,
            Payload::Battle(msg) => {
                self.handle_battle(msg, outbox).await?;
                Ok(false)
            }
            Payload::Relay(_) => {
                outbox.error(400, "relay events only flow from the server").await?;
                Ok(false)
            }
        }
    }

    async fn handle_system(
        &mut self,
        msg: SystemMessage,
        outbox: &mut Outbox<'_>,
    ) -> Result<bool, RelayError> {
        let player_id = self.player_id;
        match msg {
            SystemMessage::Heartbeat { client_time } => {
                let server_time = outbox.elapsed_ms();
                outbox
                    .system(SystemMessage::HeartbeatAck {
                        client_time,
                        server_time,
                    })
                    .await?;
            }

            SystemMessage::FindMatch { game } => {
                let result = self
                    .state
                    .matchmaker
                    .lock()
                    .await
                    .find_match(player_id, game, self.outbound_tx.clone());
                match result {
                    Ok(FindResult::Queued) => outbox.system(SystemMessage::Queued { game }).await?,
                    // MatchStarted arrives through the outbound channel.
                    Ok(FindResult::Matched(match_id)) => {
                        tracing::debug!(%player_id, %match_id, "paired");
                    }
                    Err(e) => outbox.error(error_code(&e), e.to_string()).await?,
                }
            }

            SystemMessage::CancelFind => {
                let result = self.state.matchmaker.lock().await.cancel_find(player_id);
                if let Err(e) = result {
                    outbox.error(error_code(&e), e.to_string()).await?;
                }
            }

            SystemMessage::Disconnect { reason } => {
                tracing::info!(%player_id, %reason, "client disconnected");
                return Ok(true);
            }

            other => {
                tracing::debug!(%player_id, ?other, "unexpected system message");
                outbox.error(400, "unexpected system message").await?;
            }
        }
        Ok(false)
    }

    async fn handle_battle(
        &mut self,
        msg: BattleMessage,
        outbox: &mut Outbox<'_>,
    ) -> Result<(), RelayError> {
        let cached = self.current_match.as_ref().filter(|h| !h.is_closed()).cloned();
        let handle = match cached {
            Some(handle) => handle,
            None => {
                let lookup = self.state.matchmaker.lock().await.match_handle(self.player_id);
                match lookup {
                    Ok(handle) => {
                        self.current_match = Some(handle.clone());
                        handle
                    }
                    Err(e) => {
                        self.current_match = None;
                        return outbox.error(error_code(&e), e.to_string()).await;
                    }
                }
            }
        };

        if let Err(e) = handle.send_battle(self.player_id, msg).await {
            outbox.error(error_code(&e), e.to_string()).await?;
        }
        Ok(())
    }
}

/// HTTP-style status code for a matchmaking failure.
fn error_code(err: &BattleError) -> u16 {
    match err {
        BattleError::NotFound(_)
        | BattleError::NoMatch(_)
        | BattleError::NotInMatch(..)
        | BattleError::NotQueued(_) => 404,
        BattleError::AlreadyQueued(_)
        | BattleError::AlreadyInMatch(..)
        | BattleError::Desync { .. }
        | BattleError::ArtifactDesync { .. } => 409,
        BattleError::Unavailable(_) => 410,
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
