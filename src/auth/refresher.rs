//! The token refresher seam.
//!
//! When a request comes back `401 Unauthorized`, the client asks its
//! [`TokenRefresher`] for a new bearer token. The refresher owns the
//! credential lifecycle; the client only caches the token it is handed in
//! its default `Authorization` header.

use async_trait::async_trait;
use thiserror::Error;

use crate::clients::BoxError;
use crate::config::AccessToken;

/// Error returned by a [`TokenRefresher`].
///
/// The two variants drive different outcomes in the client:
/// `InvalidToken` is terminal, `Failed` may be retried by a higher layer.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The credential is structurally invalid, not merely expired.
    #[error("{0}")]
    InvalidToken(String),

    /// A new token could not be obtained.
    #[error(transparent)]
    Failed(#[from] BoxError),
}

impl RefreshError {
    /// Wraps any error as a refresh failure.
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Failed(error.into())
    }
}

/// Produces a fresh bearer token after an authorization failure.
///
/// The client may call `refresh_token` from several tasks at once when
/// concurrent requests all see a `401`; implementations must tolerate that.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use cloud_api::AccessToken;
/// use cloud_api::auth::{RefreshError, TokenRefresher};
///
/// struct StaticToken(String);
///
/// #[async_trait]
/// impl TokenRefresher for StaticToken {
///     async fn refresh_token(&self) -> Result<AccessToken, RefreshError> {
///         AccessToken::new(self.0.clone()).map_err(RefreshError::failed)
///     }
/// }
/// ```
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Obtains a new token.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::InvalidToken`] when the credential can never
    /// be refreshed, or [`RefreshError::Failed`] for any other failure.
    async fn refresh_token(&self) -> Result<AccessToken, RefreshError>;
}
