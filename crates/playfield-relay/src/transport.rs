//! WebSocket transport on top of `tokio-tungstenite`.
//!
//! Each connection is split into a sink and a stream behind separate locks,
//! so a handler can wait for the next frame while relay events are written
//! to the same socket.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::TransportError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Identifies one accepted socket, independent of who authenticates on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Listens for incoming WebSocket connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next TCP connection and completes the WebSocket upgrade.
    pub async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one binary frame.
    pub async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    /// Receives the next data frame. `Ok(None)` means the peer closed.
    ///
    /// Text and binary frames are both accepted; control frames are skipped.
    pub async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    /// Starts the closing handshake.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
