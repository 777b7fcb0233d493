//! Relay server configuration.

use std::collections::HashMap;
use std::time::Duration;

use playfield_battle::MatchConfig;
use playfield_protocol::PlayerId;

use crate::RelayError;

/// Everything the relay binary reads from its environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,

    /// How long a new connection has to send `Handshake`.
    pub handshake_timeout: Duration,

    /// A connection that sends nothing (not even a heartbeat) for this long
    /// is dropped.
    pub idle_timeout: Duration,

    pub match_config: MatchConfig,

    /// Accepted handshake tokens. Empty means guests are let in.
    pub tokens: HashMap<String, PlayerId>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(15),
            match_config: MatchConfig::default(),
            tokens: HashMap::new(),
        }
    }
}

impl RelayConfig {
    /// Reads the `PLAYFIELD_*` environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<Duration, RelayError> {
            lookup(key)
                .map(|v| {
                    v.trim().parse().map(Duration::from_secs).map_err(|_| {
                        RelayError::Config(format!("{key}: expected seconds, got {v:?}"))
                    })
                })
                .unwrap_or(Ok(default))
        };

        Ok(Self {
            bind_addr: lookup("PLAYFIELD_BIND").unwrap_or(defaults.bind_addr),
            handshake_timeout: secs(
                "PLAYFIELD_HANDSHAKE_TIMEOUT_SECS",
                defaults.handshake_timeout,
            )?,
            idle_timeout: secs("PLAYFIELD_IDLE_TIMEOUT_SECS", defaults.idle_timeout)?,
            match_config: MatchConfig {
                time_limit: secs(
                    "PLAYFIELD_MATCH_TIME_LIMIT_SECS",
                    defaults.match_config.time_limit,
                )?,
                ..defaults.match_config
            },
            tokens: match lookup("PLAYFIELD_TOKENS") {
                Some(spec) => parse_tokens(&spec)?,
                None => defaults.tokens,
            },
        })
    }
}

/// Parses `token=id,token=id`. Blank entries are skipped.
fn parse_tokens(spec: &str) -> Result<HashMap<String, PlayerId>, RelayError> {
    let mut tokens = HashMap::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid =
            |what: &str| RelayError::Config(format!("PLAYFIELD_TOKENS: {what} in {entry:?}"));
        let (token, id) = entry.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let id = id.trim().parse().map_err(|_| invalid("bad player id"))?;
        tokens.insert(token.trim().to_string(), PlayerId(id));
    }
    Ok(tokens)
}
