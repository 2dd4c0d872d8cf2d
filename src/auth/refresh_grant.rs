//! OAuth 2.0 refresh-token grant.
//!
//! [`RefreshTokenGrant`] is a ready-made [`TokenRefresher`] for identity
//! services that hand out a long-lived refresh token alongside short-lived
//! bearer tokens. Each refresh posts a `refresh_token` grant to the token
//! endpoint and, when the server rotates the refresh token, keeps the new one
//! for the next refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cloud_api::{ApiClient, BaseUrl};
//! use cloud_api::auth::RefreshTokenGrant;
//!
//! let grant = RefreshTokenGrant::new(
//!     BaseUrl::new("https://iam.example.com/identity/token")?,
//!     "cf",
//!     "",
//!     stored_refresh_token,
//! )?;
//!
//! let client = ApiClient::new(BaseUrl::new("https://api.example.com")?, None)?
//!     .with_token_refresher(Arc::new(grant));
//! ```

use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{RefreshError, TokenRefresher};
use crate::config::{AccessToken, BaseUrl};
use crate::error::ConfigError;

/// Grant type for refresh token requests.
const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// OAuth error codes meaning the refresh token itself is unusable.
const INVALID_TOKEN_CODES: [&str; 2] = ["invalid_token", "invalid_grant"];

/// Error returned when the token endpoint could not issue a token.
///
/// A status of `0` means no response was received.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Token refresh failed with status {status}: {message}")]
pub struct TokenGrantError {
    /// HTTP status of the token endpoint response, or `0` for network errors.
    pub status: u16,
    /// The error body or a description of the failure.
    pub message: String,
}

/// Form body for the refresh request.
#[derive(Debug, Serialize)]
struct TokenRefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u32>,
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug)]
struct GrantState {
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Refreshes bearer tokens with an OAuth 2.0 `refresh_token` grant.
///
/// The client credentials are sent with HTTP basic authentication. The
/// refresh token is rotated in place whenever the server returns a new one.
pub struct RefreshTokenGrant {
    client: reqwest::Client,
    token_url: BaseUrl,
    client_id: String,
    client_secret: String,
    state: Mutex<GrantState>,
}

// Verify RefreshTokenGrant is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RefreshTokenGrant>();
};

impl RefreshTokenGrant {
    /// Creates a refresher for the given token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if `refresh_token` is empty,
    /// or [`ConfigError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        token_url: BaseUrl,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let refresh_token = refresh_token.into();
        if refresh_token.trim().is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| ConfigError::HttpClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            state: Mutex::new(GrantState {
                refresh_token,
                expires_at: None,
            }),
        })
    }

    /// Returns the token endpoint.
    #[must_use]
    pub const fn token_url(&self) -> &BaseUrl {
        &self.token_url
    }

    /// Returns when the most recently issued access token expires, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock_state().expires_at
    }

    /// Returns `true` if the most recently issued access token has expired.
    ///
    /// Returns `false` before the first refresh or when the server did not
    /// report a lifetime.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| Utc::now() > expires_at)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, GrantState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn classify_failure(status: u16, body: String) -> RefreshError {
        if let Ok(error) = serde_json::from_str::<TokenErrorResponse>(&body) {
            if INVALID_TOKEN_CODES.contains(&error.error.as_str()) {
                return RefreshError::InvalidToken(
                    error.error_description.unwrap_or(error.error),
                );
            }
        }

        RefreshError::failed(TokenGrantError {
            status,
            message: body,
        })
    }
}

#[async_trait]
impl TokenRefresher for RefreshTokenGrant {
    async fn refresh_token(&self) -> Result<AccessToken, RefreshError> {
        let refresh_token = self.lock_state().refresh_token.clone();

        let request_body = TokenRefreshRequest {
            grant_type: REFRESH_TOKEN_GRANT_TYPE,
            refresh_token: &refresh_token,
        };

        let response = self
            .client
            .post(self.token_url.as_ref())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("Accept", "application/json")
            .form(&request_body)
            .send()
            .await
            .map_err(|e| {
                RefreshError::failed(TokenGrantError {
                    status: 0,
                    message: format!("Network error: {e}"),
                })
            })?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status, url = %self.token_url, "Token endpoint rejected refresh");
            return Err(Self::classify_failure(status, error_body));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            RefreshError::failed(TokenGrantError {
                status,
                message: format!("Failed to parse token response: {e}"),
            })
        })?;

        let token = AccessToken::new(token_response.access_token).map_err(RefreshError::failed)?;

        let mut state = self.lock_state();
        if let Some(rotated) = token_response.refresh_token.filter(|t| !t.trim().is_empty()) {
            state.refresh_token = rotated;
        }
        state.expires_at = token_response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(i64::from(seconds)));
        drop(state);

        Ok(token)
    }
}

impl fmt::Debug for RefreshTokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenGrant")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"*****")
            .field("refresh_token", &"*****")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn grant(server: &MockServer, refresh_token: &str) -> RefreshTokenGrant {
        let url = BaseUrl::new(format!("{}/identity/token", server.uri())).unwrap();
        RefreshTokenGrant::new(url, "cf", "", refresh_token).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_refresh_token() {
        let url = BaseUrl::new("https://iam.example.com/identity/token").unwrap();
        let result = RefreshTokenGrant::new(url, "cf", "", "  ");
        assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let url = BaseUrl::new("https://iam.example.com/identity/token").unwrap();
        let grant = RefreshTokenGrant::new(url, "cf", "top-secret", "refresh-abc").unwrap();
        let debug = format!("{grant:?}");
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("refresh-abc"));
        assert!(debug.contains("cf"));
    }

    #[tokio::test]
    async fn test_refresh_posts_grant_and_rotates_refresh_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=first-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "second-refresh",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(body_string_contains("refresh_token=second-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "newer-access"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = grant(&server, "first-refresh");
        assert!(grant.expires_at().is_none());

        let token = grant.refresh_token().await.unwrap();
        assert_eq!(token.as_ref(), "new-access");
        assert!(grant.expires_at().is_some());
        assert!(!grant.expired());

        let token = grant.refresh_token().await.unwrap();
        assert_eq!(token.as_ref(), "newer-access");
        assert!(grant.expires_at().is_none());
    }

    #[tokio::test]
    async fn test_invalid_grant_is_invalid_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "refresh token revoked"
            })))
            .mount(&server)
            .await;

        let result = grant(&server, "revoked").refresh_token().await;
        assert!(matches!(
            result,
            Err(RefreshError::InvalidToken(ref message)) if message == "refresh token revoked"
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let error = grant(&server, "refresh").refresh_token().await.unwrap_err();
        match error {
            RefreshError::Failed(source) => {
                let grant_error = source.downcast_ref::<TokenGrantError>().unwrap();
                assert_eq!(grant_error.status, 503);
                assert_eq!(grant_error.message, "maintenance");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = grant(&server, "refresh").refresh_token().await;
        assert!(matches!(result, Err(RefreshError::Failed(_))));
    }

    #[tokio::test]
    async fn test_network_error_has_zero_status() {
        let url = BaseUrl::new("http://127.0.0.1:1/identity/token").unwrap();
        let grant = RefreshTokenGrant::new(url, "cf", "", "refresh").unwrap();

        let error = grant.refresh_token().await.unwrap_err();
        match error {
            RefreshError::Failed(source) => {
                let grant_error = source.downcast_ref::<TokenGrantError>().unwrap();
                assert_eq!(grant_error.status, 0);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
