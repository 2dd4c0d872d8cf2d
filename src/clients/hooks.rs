//! Caller-supplied hooks.
//!
//! Hooks are plain function values injected when the client is built.

use std::sync::Arc;

use crate::clients::errors::BoxError;
use crate::clients::http_request::HttpRequest;

/// Runs before a request is first sent and may modify it.
///
/// Called once per execute call with a private copy of the request; the
/// copy is reused unchanged if the request is re-sent after a token refresh.
/// Returning an error aborts the call without any network traffic.
pub type BeforeHook = Arc<dyn Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync>;

/// Translates a non-2xx final response into a caller error.
///
/// Receives the status and raw body. Returning `None` keeps the generic
/// [`ApiError`](crate::clients::ApiError).
pub type ErrorHook = Arc<dyn Fn(u16, &str) -> Option<BoxError> + Send + Sync>;
