//! Handshake authentication.
//!
//! The relay does not own user accounts. An [`Authenticator`] turns the
//! token from `Handshake` into a [`PlayerId`]; the deployment picks the
//! implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use playfield_protocol::PlayerId;

use crate::AuthError;

/// Validates a client's token and returns their identity.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use playfield_protocol::PlayerId;
/// use playfield_relay::{AuthError, Authenticator};
///
/// /// Uses the token itself as the numeric player ID.
/// struct NumericAuthenticator;
///
/// impl Authenticator for NumericAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
///         token
///             .parse()
///             .map(PlayerId)
///             .map_err(|_| AuthError::Rejected("token must be a number".into()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// `token` is empty when the client sent none.
    fn authenticate(&self, token: &str) -> impl Future<Output = Result<PlayerId, AuthError>> + Send;
}

/// Accepts a fixed set of tokens, each bound to one player.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, PlayerId>,
}

impl TokenAuthenticator {
    pub fn new(tokens: HashMap<String, PlayerId>) -> Self {
        Self { tokens }
    }

    /// Adds one token.
    pub fn with(mut self, token: impl Into<String>, player_id: PlayerId) -> Self {
        self.tokens.insert(token.into(), player_id);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AuthError::Rejected("unknown token".into()))
    }
}

/// First ID handed out to guests, far above anything a token table uses.
const FIRST_GUEST_ID: u64 = 1 << 32;

/// Lets anyone in with a fresh identity. Local play and development only.
#[derive(Debug)]
pub struct GuestAuthenticator {
    next: AtomicU64,
}

impl Default for GuestAuthenticator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(FIRST_GUEST_ID),
        }
    }
}

impl Authenticator for GuestAuthenticator {
    async fn authenticate(&self, _token: &str) -> Result<PlayerId, AuthError> {
        Ok(PlayerId(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_table() {
        let auth = TokenAuthenticator::default()
            .with("alice", PlayerId(1))
            .with("bob", PlayerId(2));
        assert_eq!(auth.len(), 2);
        assert_eq!(auth.authenticate("bob").await.unwrap(), PlayerId(2));
        assert!(matches!(
            auth.authenticate("mallory").await,
            Err(AuthError::Rejected(_))
        ));
        assert!(auth.authenticate("").await.is_err());
    }

    #[tokio::test]
    async fn test_guests_get_distinct_ids() {
        let auth = GuestAuthenticator::default();
        let a = auth.authenticate("").await.unwrap();
        let b = auth.authenticate("").await.unwrap();
        assert_ne!(a, b);
        assert!(a.0 >= FIRST_GUEST_ID);
    }
}
