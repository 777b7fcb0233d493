//! Error types for the relay server.

use playfield_battle::BattleError;
use playfield_protocol::{PlayerId, ProtocolError};

/// Errors from the WebSocket layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, accepting, or the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

/// Errors from the handshake's identity check.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    Rejected(String),

    /// The player already has a live connection.
    #[error("{0} is already connected")]
    AlreadyConnected(PlayerId),
}

/// Top-level error for the relay.
///
/// `#[from]` on each variant lets `?` lift errors from the lower crates.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    /// An environment variable held something unparsable.
    #[error("invalid configuration: {0}")]
    Config(String),
}
