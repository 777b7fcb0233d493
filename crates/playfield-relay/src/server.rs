//! `RelayServer` builder and accept loop.

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use playfield_battle::Matchmaker;
use playfield_protocol::{JsonCodec, PlayerId};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::transport::WebSocketTransport;
use crate::{Authenticator, RelayConfig, RelayError};

/// Shared state handed to every connection task.
pub(crate) struct RelayState<A: Authenticator> {
    pub(crate) matchmaker: Mutex<Matchmaker>,
    /// Players with a live, authenticated connection.
    pub(crate) online: Mutex<HashSet<PlayerId>>,
    pub(crate) auth: A,
    pub(crate) codec: JsonCodec,
    pub(crate) config: RelayConfig,
}

/// Builder for a [`RelayServer`].
///
/// ```rust,ignore
/// let server = RelayServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(TokenAuthenticator::default().with("alice", PlayerId(1)))
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    config: RelayConfig,
}

impl RelayServerBuilder {
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Replaces the whole configuration, bind address included.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener. The server does not accept until [`RelayServer::run`].
    pub async fn build<A: Authenticator>(self, auth: A) -> Result<RelayServer<A>, RelayError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(RelayState {
            matchmaker: Mutex::new(Matchmaker::new(self.config.match_config.clone())),
            online: Mutex::new(HashSet::new()),
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(RelayServer { transport, state })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
pub struct RelayServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<RelayState<A>>,
}

impl<A: Authenticator> RelayServer<A> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections until the process ends.
    pub async fn run(self) -> Result<(), RelayError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then aborts every
    /// running match so both players get a result.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), RelayError> {
        tracing::info!("Playfield relay running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("shutting down");
        self.state.matchmaker.lock().await.shutdown().await;
        Ok(())
    }
}
