//! Authentication hook for the handshake.
//!
//! Gridsync does not decide who a player is. The server hands the token
//! from the client's `Handshake` to an [`Authenticator`] and uses the
//! [`PlayerId`] it returns.

use std::sync::atomic::{AtomicU64, Ordering};

use gridsync_protocol::PlayerId;

/// Why a handshake token was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    Rejected(String),
}

/// Validates a client's token and returns their identity.
///
/// ```rust
/// use gridsync::{AuthError, Authenticator, PlayerId};
///
/// /// Uses the token itself as the player number.
/// struct NumericToken;
///
/// impl Authenticator for NumericToken {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
///         token
///             .parse()
///             .map(PlayerId)
///             .map_err(|_| AuthError::Rejected("token must be a number".into()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, AuthError>> + Send;
}

/// Accepts every client and gives each connection a fresh player ID.
#[derive(Debug)]
pub struct AnonymousAuthenticator {
    next: AtomicU64,
}

impl AnonymousAuthenticator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for AnonymousAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for AnonymousAuthenticator {
    async fn authenticate(&self, _token: &str) -> Result<PlayerId, AuthError> {
        Ok(PlayerId(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}
