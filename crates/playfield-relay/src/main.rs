use playfield_relay::{
    Authenticator, GuestAuthenticator, RelayConfig, RelayError, RelayServerBuilder,
    TokenAuthenticator,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RelayConfig::from_env()?;
    if config.tokens.is_empty() {
        tracing::warn!("PLAYFIELD_TOKENS is not set, accepting guests");
        serve(config, GuestAuthenticator::default()).await
    } else {
        let auth = TokenAuthenticator::new(config.tokens.clone());
        tracing::info!(tokens = auth.len(), "token authentication enabled");
        serve(config, auth).await
    }
}

async fn serve(config: RelayConfig, auth: impl Authenticator) -> Result<(), RelayError> {
    let server = RelayServerBuilder::new().config(config).build(auth).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
