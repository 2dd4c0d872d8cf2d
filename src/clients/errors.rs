//! Error taxonomy for the API client.
//!
//! Every failure the client can produce is normalized into [`ClientError`]
//! before it reaches the caller. Transport-library errors are type-erased into
//! [`NetworkError`]; no `reqwest` type appears in the public error surface.
//!
//! # Error Handling
//!
//! - [`ClientError::Configuration`]: the endpoint could not be resolved
//! - [`ClientError::InvalidRequest`]: the request failed validation before sending
//! - [`ClientError::PreRequest`]: the pre-request hook rejected the request
//! - [`ClientError::Network`]: transport-level failure, target host attached
//! - [`ClientError::Auth`]: token refresh was attempted and did not succeed
//! - [`ClientError::Api`]: non-2xx response, status and raw body preserved
//! - [`ClientError::Translated`]: non-2xx response converted by the error hook, status kept
//! - [`ClientError::Decoding`]: the response body did not match the target type
//! - [`ClientError::Cancelled`]: the request context was cancelled or timed out
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_api::clients::{ClientError, RequestContext};
//!
//! match client.delete("/v2/apps/1234", &RequestContext::new()).await {
//!     Ok(_) => println!("deleted"),
//!     Err(e) if e.is_not_found() => println!("already gone"),
//!     Err(ClientError::Auth(e)) => println!("re-authenticate: {e}"),
//!     Err(e) => return Err(e),
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::error::ConfigError;

/// A type-erased error used for collaborator and hook failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned when a request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request body could not be serialized to JSON.
    #[error("Cannot serialize request body: {reason}")]
    InvalidBody {
        /// The serializer's error message.
        reason: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// The transport refused to build the request; nothing was sent.
    #[error("Cannot build request: {reason}")]
    Malformed {
        /// The transport's error message.
        reason: String,
    },
}

/// A transport-level failure: connection refused, DNS failure, timeout,
/// or a body that could not be read.
///
/// This layer never retries network errors.
#[derive(Debug, Error)]
#[error("Network error talking to {host}: {source}")]
pub struct NetworkError {
    /// The host the request was addressed to.
    pub host: String,
    /// Whether the transport gave up because its own timeout elapsed.
    pub is_timeout: bool,
    /// Whether the failure happened while connecting.
    pub is_connect: bool,
    /// The underlying transport error.
    #[source]
    pub source: BoxError,
}

impl NetworkError {
    pub(crate) fn from_transport(host: impl Into<String>, error: reqwest::Error) -> Self {
        Self {
            host: host.into(),
            is_timeout: error.is_timeout(),
            is_connect: error.is_connect(),
            source: Box::new(error),
        }
    }
}

impl ClientError {
    /// Classifies a reqwest failure. Builder errors never reached the wire.
    pub(crate) fn from_transport(host: &str, error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::InvalidRequest(InvalidHttpRequestError::Malformed {
                reason: error.to_string(),
            })
        } else {
            Self::Network(NetworkError::from_transport(host, error))
        }
    }
}

/// Which part of the token refresh failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The refresher reported the token is structurally invalid, not just expired.
    InvalidToken,
    /// The refresher could not obtain a new token.
    RefreshFailed,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "InvalidToken"),
            Self::RefreshFailed => write!(f, "RefreshFailed"),
        }
    }
}

/// Error returned when a 401 response could not be recovered by refreshing
/// the token.
#[derive(Debug, Error)]
#[error("{}", auth_message(.kind, .source))]
pub struct AuthError {
    /// What went wrong.
    pub kind: AuthErrorKind,
    /// The status of the response that triggered the refresh (always 401).
    pub status: u16,
    /// The refresher's failure.
    #[source]
    pub source: BoxError,
}

fn auth_message(kind: &AuthErrorKind, source: &BoxError) -> String {
    match kind {
        AuthErrorKind::InvalidToken => format!("InvalidToken: {source}"),
        AuthErrorKind::RefreshFailed => {
            format!("Authentication failed, unable to refresh auth token: {source}. Try again later")
        }
    }
}

/// Error returned for a non-2xx response that no error hook translated.
///
/// The literal status code and raw response body are preserved so callers
/// can match on provider-specific error codes embedded in the body.
///
/// # Example
///
/// ```rust
/// use cloud_api::clients::ApiError;
///
/// let error = ApiError {
///     status: 404,
///     body: r#"{"code":100004,"error_code":"CF-AppNotFound"}"#.to_string(),
///     request_id: None,
///     after_refresh: false,
/// };
///
/// assert_eq!(error.error_code().as_deref(), Some("CF-AppNotFound"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Request failed with status {status}: {body}")]
pub struct ApiError {
    /// The HTTP status code of the final response.
    pub status: u16,
    /// The raw response body.
    pub body: String,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub request_id: Option<String>,
    /// `true` when this response came from the retry after a token refresh.
    pub after_refresh: bool,
}

impl ApiError {
    /// Parses the raw body as JSON, if it is JSON.
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Returns the provider error code embedded in a JSON body.
    ///
    /// Looks at `error_code`, `errorCode` and `code` in that order; numeric
    /// codes are returned in their decimal form.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        let body = self.body_json()?;
        ["error_code", "errorCode", "code"]
            .iter()
            .find_map(|key| match body.get(key)? {
                serde_json::Value::String(code) => Some(code.clone()),
                serde_json::Value::Number(code) => Some(code.to_string()),
                _ => None,
            })
    }
}

/// A non-2xx response converted by the error hook.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TranslatedError {
    /// The HTTP status code of the final response.
    pub status: u16,
    /// `true` when this response came from the retry after a token refresh.
    pub after_refresh: bool,
    /// The error produced by the hook.
    #[source]
    pub source: BoxError,
}

/// Error returned when a response body does not match the requested type.
#[derive(Debug, Error)]
#[error("Error parsing JSON into {target} ({context}): {source}")]
pub struct DecodingError {
    /// The Rust type the body was decoded into.
    pub target: &'static str,
    /// Where the mismatching value came from.
    pub context: String,
    /// The deserializer's error.
    #[source]
    pub source: serde_json::Error,
}

/// Why a request context stopped a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The cancellation token was triggered.
    Cancelled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "request cancelled"),
            Self::DeadlineExceeded => write!(f, "request deadline exceeded"),
        }
    }
}

/// Unified error type for every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint resolver could not supply a usable base URL.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The pre-request hook rejected the request; nothing was sent.
    #[error("Pre-request hook failed: {0}")]
    PreRequest(#[source] BoxError),

    /// Network or connection error.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Token refresh after a 401 did not succeed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Non-2xx response translated by the error hook.
    #[error(transparent)]
    Translated(TranslatedError),

    /// The response body did not match the requested type.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// The request context was cancelled or its deadline passed.
    #[error("{0}")]
    Cancelled(CancelReason),
}

impl ClientError {
    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            Self::Translated(e) => Some(e.status),
            Self::Auth(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns `true` if the final response came from the re-send after a
    /// token refresh.
    #[must_use]
    pub const fn after_refresh(&self) -> bool {
        match self {
            Self::Api(e) => e.after_refresh,
            Self::Translated(e) => e.after_refresh,
            _ => false,
        }
    }

    /// Returns the API error if this is an untranslated non-2xx response.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` for a 404 response.
    ///
    /// Existence checks use this to treat a missing resource as absent
    /// rather than as a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// Returns `true` if the request context stopped this call.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns the auth error kind, if this is an auth failure.
    #[must_use]
    pub const fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Auth(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Error returned when a pagination walk aborts.
///
/// Items delivered to the consumer before the failure are not retracted:
/// delivery is at-least-once, not transactional. The cursor identifies the
/// page that failed so a caller can decide whether to resume from it.
#[derive(Debug, Error)]
#[error("Pagination aborted at '{cursor}' after {pages_fetched} page(s) and {items_delivered} item(s): {error}")]
pub struct PaginationError {
    /// The cursor (path) whose fetch or decode failed.
    pub cursor: String,
    /// Pages fully fetched before the failure.
    pub pages_fetched: usize,
    /// Items handed to the consumer before the failure.
    pub items_delivered: usize,
    /// The underlying failure.
    #[source]
    pub error: ClientError,
}

impl PaginationError {
    /// Returns the underlying client error.
    #[must_use]
    pub const fn error(&self) -> &ClientError {
        &self.error
    }

    /// Consumes the pagination error, returning the underlying client error.
    #[must_use]
    pub fn into_inner(self) -> ClientError {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, body: &str) -> ApiError {
        ApiError {
            status,
            body: body.to_string(),
            request_id: None,
            after_refresh: false,
        }
    }

    #[test]
    fn test_api_error_includes_status_and_body_in_message() {
        let error = api_error(404, r#"{"error":"Not Found"}"#);
        assert_eq!(
            error.to_string(),
            r#"Request failed with status 404: {"error":"Not Found"}"#
        );
    }

    #[test]
    fn test_api_error_code_prefers_error_code_field() {
        let error = api_error(
            400,
            r#"{"code":10001,"description":"bad","error_code":"CF-MessageParseError"}"#,
        );
        assert_eq!(error.error_code().as_deref(), Some("CF-MessageParseError"));
    }

    #[test]
    fn test_api_error_code_falls_back_to_code() {
        let error = api_error(404, r#"{"code":"PolicyNotFound"}"#);
        assert_eq!(error.error_code().as_deref(), Some("PolicyNotFound"));

        let error = api_error(404, r#"{"code":100004}"#);
        assert_eq!(error.error_code().as_deref(), Some("100004"));
    }

    #[test]
    fn test_api_error_code_none_for_non_json_body() {
        let error = api_error(502, "<html>Bad Gateway</html>");
        assert!(error.body_json().is_none());
        assert!(error.error_code().is_none());
    }

    #[test]
    fn test_auth_error_messages() {
        let invalid = AuthError {
            kind: AuthErrorKind::InvalidToken,
            status: 401,
            source: "token signature mismatch".into(),
        };
        assert_eq!(invalid.to_string(), "InvalidToken: token signature mismatch");

        let failed = AuthError {
            kind: AuthErrorKind::RefreshFailed,
            status: 401,
            source: "connection reset".into(),
        };
        let message = failed.to_string();
        assert!(message.contains("unable to refresh auth token"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_client_error_status_and_not_found() {
        let error = ClientError::Api(api_error(404, "{}"));
        assert_eq!(error.status(), Some(404));
        assert!(error.is_not_found());
        assert!(error.api_error().is_some());

        let error = ClientError::Cancelled(CancelReason::DeadlineExceeded);
        assert_eq!(error.status(), None);
        assert!(!error.is_not_found());
        assert!(error.is_cancelled());
        assert_eq!(error.to_string(), "request deadline exceeded");
    }

    #[test]
    fn test_translated_error_keeps_status_and_refresh_flag() {
        let error = ClientError::Translated(TranslatedError {
            status: 409,
            after_refresh: true,
            source: "name already taken".into(),
        });
        assert_eq!(error.to_string(), "name already taken");
        assert_eq!(error.status(), Some(409));
        assert!(error.after_refresh());
        assert!(error.api_error().is_none());

        let error = ClientError::Api(api_error(401, ""));
        assert!(!error.after_refresh());
    }

    #[test]
    fn test_invalid_header_message() {
        let error = InvalidHttpRequestError::InvalidHeader {
            name: "Bad Header".to_string(),
            reason: "invalid HTTP header name".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid header 'Bad Header': invalid HTTP header name"
        );
    }

    #[test]
    fn test_client_error_auth_kind() {
        let error = ClientError::Auth(AuthError {
            kind: AuthErrorKind::InvalidToken,
            status: 401,
            source: "bad".into(),
        });
        assert_eq!(error.auth_kind(), Some(AuthErrorKind::InvalidToken));
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn test_invalid_request_error_missing_body() {
        let error = InvalidHttpRequestError::MissingBody {
            method: "patch".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot use patch without specifying data.");
    }

    #[test]
    fn test_pagination_error_carries_cursor() {
        let error = PaginationError {
            cursor: "/v2/apps?page=3".to_string(),
            pages_fetched: 2,
            items_delivered: 100,
            error: ClientError::Cancelled(CancelReason::Cancelled),
        };
        let message = error.to_string();
        assert!(message.contains("/v2/apps?page=3"));
        assert!(message.contains("2 page(s)"));
        assert!(error.error().is_cancelled());
        assert!(error.into_inner().is_cancelled());
    }

    #[test]
    fn test_error_types_implement_std_error() {
        let _: &dyn std::error::Error = &api_error(400, "");
        let _: &dyn std::error::Error = &ClientError::Cancelled(CancelReason::Cancelled);
        let _: &dyn std::error::Error = &InvalidHttpRequestError::MissingBody {
            method: "post".to_string(),
        };
    }

    #[test]
    fn test_client_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
        assert_send_sync::<PaginationError>();
    }
}
