//! # Playfield relay
//!
//! WebSocket server for two-player battles. It authenticates players, pairs
//! them per game, hands both the same seed, and relays moves, progress, and
//! results between them. Games are simulated on the clients; the relay only
//! checks that both sides stay in step.
//!
//! ```rust,no_run
//! use playfield_relay::{GuestAuthenticator, RelayServerBuilder};
//!
//! # async fn serve() -> Result<(), playfield_relay::RelayError> {
//! let server = RelayServerBuilder::new()
//!     .bind("127.0.0.1:8080")
//!     .build(GuestAuthenticator::default())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod transport;

pub use auth::{Authenticator, GuestAuthenticator, TokenAuthenticator};
pub use config::RelayConfig;
pub use error::{AuthError, RelayError, TransportError};
pub use server::{RelayServer, RelayServerBuilder};
pub use transport::{ConnectionId, WebSocketConnection, WebSocketTransport};
