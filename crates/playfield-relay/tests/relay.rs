//! End-to-end tests: real WebSocket clients against a relay on a random port.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use playfield_games::{Direction, GameInput, GameKind, GameStatus, SnakeInput};
use playfield_protocol::{
    BattleMessage, Envelope, MatchOutcome, Payload, PlayerId, Progress, RelayEvent, SystemMessage,
    PROTOCOL_VERSION,
};
use playfield_random::{Fingerprint, SeededRandom};
use playfield_relay::{RelayServerBuilder, TokenAuthenticator};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

async fn start_server() -> SocketAddr {
    let auth = TokenAuthenticator::default()
        .with("alice", ALICE)
        .with("bob", BOB);
    let server = RelayServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(auth)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(ws: &mut Ws, payload: Payload) {
    let envelope = Envelope {
        seq: 0,
        timestamp: 0,
        payload,
    };
    let bytes = serde_json::to_vec(&envelope).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn send_system(ws: &mut Ws, msg: SystemMessage) {
    send(ws, Payload::System(msg)).await;
}

async fn recv(ws: &mut Ws) -> Payload {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for the relay")
            .expect("connection closed")
            .expect("websocket error");
        if msg.is_binary() || msg.is_text() {
            let envelope: Envelope = serde_json::from_slice(&msg.into_data()).unwrap();
            return envelope.payload;
        }
    }
}

async fn expect_error(ws: &mut Ws) -> u16 {
    match recv(ws).await {
        Payload::System(SystemMessage::Error { code, .. }) => code,
        other => panic!("expected Error, got {other:?}"),
    }
}

async fn handshake(ws: &mut Ws, version: u32, token: Option<&str>) -> Payload {
    send_system(ws, SystemMessage::Handshake {
        version,
        token: token.map(str::to_string),
    })
    .await;
    recv(ws).await
}

/// Connects and authenticates.
async fn login(addr: SocketAddr, token: &str) -> Ws {
    let mut ws = connect(addr).await;
    let ack = handshake(&mut ws, PROTOCOL_VERSION, Some(token)).await;
    assert!(matches!(ack, Payload::System(SystemMessage::HandshakeAck { .. })));
    ws
}

struct Started {
    seed: i64,
    opponent: PlayerId,
}

async fn expect_started(ws: &mut Ws) -> Started {
    match recv(ws).await {
        Payload::System(SystemMessage::MatchStarted { seed, opponent, .. }) => {
            Started { seed, opponent }
        }
        other => panic!("expected MatchStarted, got {other:?}"),
    }
}

async fn expect_result(ws: &mut Ws) -> MatchOutcome {
    match recv(ws).await {
        Payload::Relay(RelayEvent::MatchResult { outcome }) => outcome,
        other => panic!("expected MatchResult, got {other:?}"),
    }
}

/// Alice and Bob logged in and paired for Snake. Returns the shared seed.
async fn paired(addr: SocketAddr) -> (Ws, Ws, i64) {
    let mut alice = login(addr, "alice").await;
    let mut bob = login(addr, "bob").await;

    send_system(&mut alice, SystemMessage::FindMatch { game: GameKind::Snake }).await;
    assert_eq!(
        recv(&mut alice).await,
        Payload::System(SystemMessage::Queued { game: GameKind::Snake })
    );
    send_system(&mut bob, SystemMessage::FindMatch { game: GameKind::Snake }).await;

    let a = expect_started(&mut alice).await;
    let b = expect_started(&mut bob).await;
    assert_eq!(a.seed, b.seed);
    assert_eq!(a.opponent, BOB);
    assert_eq!(b.opponent, ALICE);
    (alice, bob, a.seed)
}

fn progress(seed: i64, draws: u64, score: u64) -> Payload {
    Payload::Battle(BattleMessage::Progress(Progress {
        status: GameStatus::Playing,
        score,
        elapsed_ms: 1_000,
        checkpoint: SeededRandom::checkpoint_at(seed, draws),
        fingerprint: Fingerprint::default(),
    }))
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handshake_success() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    match handshake(&mut ws, PROTOCOL_VERSION, Some("bob")).await {
        Payload::System(SystemMessage::HandshakeAck { player_id, .. }) => {
            assert_eq!(player_id, BOB)
        }
        other => panic!("expected HandshakeAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_version_mismatch_rejected() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    let reply = handshake(&mut ws, PROTOCOL_VERSION + 1, Some("alice")).await;
    assert!(matches!(reply, Payload::System(SystemMessage::Error { code: 400, .. })));
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let addr = start_server().await;

    let mut ws = connect(addr).await;
    let reply = handshake(&mut ws, PROTOCOL_VERSION, Some("mallory")).await;
    assert!(matches!(reply, Payload::System(SystemMessage::Error { code: 401, .. })));

    let mut ws = connect(addr).await;
    let reply = handshake(&mut ws, PROTOCOL_VERSION, None).await;
    assert!(matches!(reply, Payload::System(SystemMessage::Error { code: 401, .. })));
}

#[tokio::test]
async fn test_first_message_must_be_handshake() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    send_system(&mut ws, SystemMessage::Heartbeat { client_time: 1 }).await;
    assert_eq!(expect_error(&mut ws).await, 400);
}

#[tokio::test]
async fn test_second_connection_for_same_player_rejected() {
    let addr = start_server().await;
    let _first = login(addr, "alice").await;

    let mut second = connect(addr).await;
    let reply = handshake(&mut second, PROTOCOL_VERSION, Some("alice")).await;
    assert!(matches!(reply, Payload::System(SystemMessage::Error { code: 409, .. })));
}

// ---------------------------------------------------------------------------
// Connection lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_heartbeat_echoes_client_time() {
    let addr = start_server().await;
    let mut ws = login(addr, "alice").await;

    send_system(&mut ws, SystemMessage::Heartbeat { client_time: 4242 }).await;
    match recv(&mut ws).await {
        Payload::System(SystemMessage::HeartbeatAck { client_time, .. }) => {
            assert_eq!(client_time, 4242)
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_closes_connection() {
    let addr = start_server().await;
    let mut ws = login(addr, "alice").await;

    send_system(&mut ws, SystemMessage::Disconnect {
        reason: "bye".into(),
    })
    .await;

    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("server did not close");
    match next {
        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_frame_reported() {
    let addr = start_server().await;
    let mut ws = login(addr, "alice").await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    assert_eq!(expect_error(&mut ws).await, 400);

    // The connection survives.
    send_system(&mut ws, SystemMessage::Heartbeat { client_time: 1 }).await;
    assert!(matches!(
        recv(&mut ws).await,
        Payload::System(SystemMessage::HeartbeatAck { .. })
    ));
}

// ---------------------------------------------------------------------------
// Matchmaking and relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cancel_find() {
    let addr = start_server().await;
    let mut ws = login(addr, "alice").await;

    send_system(&mut ws, SystemMessage::FindMatch { game: GameKind::Tetris }).await;
    assert!(matches!(recv(&mut ws).await, Payload::System(SystemMessage::Queued { .. })));

    send_system(&mut ws, SystemMessage::FindMatch { game: GameKind::Tetris }).await;
    assert_eq!(expect_error(&mut ws).await, 409);

    send_system(&mut ws, SystemMessage::CancelFind).await;
    send_system(&mut ws, SystemMessage::CancelFind).await;
    assert_eq!(expect_error(&mut ws).await, 404);
}

#[tokio::test]
async fn test_battle_message_without_match() {
    let addr = start_server().await;
    let mut ws = login(addr, "alice").await;

    send(&mut ws, progress(1, 0, 0)).await;
    assert_eq!(expect_error(&mut ws).await, 404);
}

#[tokio::test]
async fn test_moves_relayed_to_opponent() {
    let addr = start_server().await;
    let (mut alice, mut bob, _seed) = paired(addr).await;

    let input = GameInput::Snake(SnakeInput::Turn(Direction::Up));
    send(&mut alice, Payload::Battle(BattleMessage::Move { seq: 1, input })).await;

    assert_eq!(
        recv(&mut bob).await,
        Payload::Relay(RelayEvent::OpponentMove { seq: 1, input })
    );
}

#[tokio::test]
async fn test_progress_relayed_and_desync_aborts() {
    let addr = start_server().await;
    let (mut alice, mut bob, seed) = paired(addr).await;

    send(&mut alice, progress(seed, 3, 20)).await;
    match recv(&mut bob).await {
        Payload::Relay(RelayEvent::OpponentProgress(p)) => assert_eq!(p.score, 20),
        other => panic!("expected OpponentProgress, got {other:?}"),
    }

    let wrong_seed = if seed == 1 { 2 } else { 1 };
    send(&mut bob, progress(wrong_seed, 3, 20)).await;

    for ws in [&mut alice, &mut bob] {
        match expect_result(ws).await {
            MatchOutcome::Aborted(reason) => assert!(reason.contains("desync")),
            other => panic!("expected abort, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_disconnect_forfeits_and_winner_can_requeue() {
    let addr = start_server().await;
    let (mut alice, mut bob, _seed) = paired(addr).await;

    send_system(&mut bob, SystemMessage::Disconnect {
        reason: "rage quit".into(),
    })
    .await;
    assert_eq!(expect_result(&mut alice).await, MatchOutcome::Winner(ALICE));

    send_system(&mut alice, SystemMessage::FindMatch { game: GameKind::Snake }).await;
    assert!(matches!(recv(&mut alice).await, Payload::System(SystemMessage::Queued { .. })));
}
