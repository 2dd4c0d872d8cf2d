//! Request executor for cloud API communication.
//!
//! This module provides the [`ApiClient`] type, which performs one logical
//! request/response cycle per call: resolve the endpoint, run the pre-request
//! hook, send, refresh the bearer token and re-send once on `401`, translate
//! failures, and hand back the response.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{RefreshError, TokenRefresher};
use crate::clients::context::RequestContext;
use crate::clients::endpoint::EndpointResolver;
use crate::clients::errors::{
    ApiError, AuthError, AuthErrorKind, BoxError, ClientError, TranslatedError,
};
use crate::clients::hooks::{BeforeHook, ErrorHook};
use crate::clients::http_request::{wire_header, HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::path::compose;
use crate::config::{AccessToken, ClientConfig};
use crate::error::ConfigError;

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

const UNAUTHORIZED: u16 = 401;

/// Inserts a header, dropping any existing entry whose name differs only in case.
fn insert_header(headers: &mut HashMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// HTTP client for making requests to a cloud API.
///
/// The client handles:
/// - Base URL resolution on every call through an [`EndpointResolver`]
/// - Default headers including User-Agent and the bearer token
/// - A single token refresh and re-send on `401 Unauthorized`
/// - Translation of non-2xx responses through an optional error hook
///
/// The default header set is the only mutable state. It is replaced under a
/// lock when a refresh succeeds and is never locked across network I/O.
///
/// # Thread Safety
///
/// `ApiClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use cloud_api::{AccessToken, ApiClient, BaseUrl, ClientConfig};
/// use cloud_api::clients::RequestContext;
///
/// let config = ClientConfig::builder()
///     .access_token(AccessToken::new("initial-token")?)
///     .build()?;
///
/// let client = ApiClient::new(BaseUrl::new("https://api.example.com")?, Some(&config))?
///     .with_token_refresher(Arc::new(refresher));
///
/// let app: App = client.get("/v2/apps/1234", &RequestContext::new()).await?;
/// ```
pub struct ApiClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Supplies the base URL for each call.
    endpoint: Arc<dyn EndpointResolver>,
    /// Called on `401` to obtain a new token.
    token_refresher: Option<Arc<dyn TokenRefresher>>,
    /// Runs once per call before the first send.
    before: Option<BeforeHook>,
    /// Translates non-2xx final responses.
    on_error: Option<ErrorHook>,
    /// Default headers to include in all requests.
    default_headers: RwLock<HashMap<String, String>>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

impl ApiClient {
    /// Creates a new client for the given endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - A fixed [`BaseUrl`](crate::BaseUrl) or any other [`EndpointResolver`]
    /// * `config` - Optional transport settings, initial token and extra headers
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClientBuild`] if the underlying reqwest
    /// client cannot be created (e.g. TLS initialization failure).
    ///
    /// # Example
    ///
    /// ```rust
    /// use cloud_api::{ApiClient, BaseUrl};
    ///
    /// let client = ApiClient::new(BaseUrl::new("https://api.example.com").unwrap(), None).unwrap();
    /// assert_eq!(client.default_headers().get("Accept").map(String::as_str), Some("application/json"));
    /// ```
    pub fn new<E>(endpoint: E, config: Option<&ClientConfig>) -> Result<Self, ConfigError>
    where
        E: EndpointResolver + 'static,
    {
        // Build User-Agent header
        let user_agent_prefix = config
            .and_then(ClientConfig::user_agent_prefix)
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}cloud-api-client v{SDK_VERSION} | Rust {rust_version}");

        // Build default headers
        let mut default_headers = HashMap::new();
        insert_header(&mut default_headers, "User-Agent", user_agent);
        insert_header(&mut default_headers, "Accept", "application/json".to_string());

        if let Some(config) = config {
            for (name, value) in config.default_headers() {
                insert_header(&mut default_headers, name, value.clone());
            }
            if let Some(token) = config.access_token() {
                insert_header(&mut default_headers, AUTHORIZATION_HEADER, token.header_value());
            }
        }

        // Create reqwest client
        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.and_then(ClientConfig::timeout) {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.and_then(ClientConfig::connect_timeout) {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| ConfigError::HttpClientBuild {
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint: Arc::new(endpoint),
            token_refresher: None,
            before: None,
            on_error: None,
            default_headers: RwLock::new(default_headers),
        })
    }

    /// Sets the refresher called when a request is rejected with `401`.
    #[must_use]
    pub fn with_token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.token_refresher = Some(refresher);
        self
    }

    /// Sets the pre-request hook.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cloud_api::{ApiClient, BaseUrl};
    ///
    /// let client = ApiClient::new(BaseUrl::new("https://api.example.com").unwrap(), None)
    ///     .unwrap()
    ///     .with_before_hook(|request| {
    ///         request.extra_headers
    ///             .get_or_insert_with(Default::default)
    ///             .insert("X-Trace".to_string(), "1".to_string());
    ///         Ok(())
    ///     });
    /// ```
    #[must_use]
    pub fn with_before_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Sets the error hook for non-2xx final responses.
    #[must_use]
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(u16, &str) -> Option<BoxError> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Returns a snapshot of the default headers.
    #[must_use]
    pub fn default_headers(&self) -> HashMap<String, String> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the cached bearer token in the default headers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the token cannot be sent as
    /// a header value. The headers are left untouched.
    pub fn set_access_token(&self, token: &AccessToken) -> Result<(), ConfigError> {
        let value = token.header_value();
        HeaderValue::from_str(&value).map_err(|e| ConfigError::InvalidHeader {
            name: AUTHORIZATION_HEADER.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = self
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        insert_header(&mut headers, AUTHORIZATION_HEADER, value);
        Ok(())
    }

    /// Sends a request and returns the successful response.
    ///
    /// This method handles:
    /// - Request validation
    /// - Endpoint resolution and URL composition
    /// - The pre-request hook
    /// - Token refresh and a single re-send on `401`
    /// - Error translation
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if:
    /// - The endpoint cannot be resolved (`Configuration`)
    /// - Request validation fails (`InvalidRequest`)
    /// - The pre-request hook fails (`PreRequest`)
    /// - A network error occurs (`Network`)
    /// - The token refresh after a `401` fails (`Auth`)
    /// - A non-2xx response is received (`Api` or `Translated`)
    /// - The context is cancelled or its deadline passes (`Cancelled`)
    pub async fn execute(
        &self,
        request: &HttpRequest,
        ctx: &RequestContext,
    ) -> Result<HttpResponse, ClientError> {
        ctx.check()?;

        let base = self.endpoint.resolve()?;

        let mut request = request.clone();
        if let Some(before) = &self.before {
            before(&mut request).map_err(ClientError::PreRequest)?;
        }
        request.verify()?;

        let composed = compose(base.as_ref(), &request.path);
        let url = reqwest::Url::parse(&composed)
            .map_err(|_| ConfigError::InvalidBaseUrl { url: composed })?;

        let response = ctx.run(self.send_once(&request, &url)).await??;

        if response.status != UNAUTHORIZED {
            return self.finish(response, false);
        }
        let Some(refresher) = &self.token_refresher else {
            return self.finish(response, false);
        };

        tracing::debug!(path = %request.path, "Received 401, refreshing token");
        let token = match ctx.run(refresher.refresh_token()).await? {
            Ok(token) => token,
            Err(RefreshError::InvalidToken(reason)) => {
                tracing::warn!(path = %request.path, "Token refresh rejected: token is invalid");
                return Err(AuthError {
                    kind: AuthErrorKind::InvalidToken,
                    status: UNAUTHORIZED,
                    source: reason.into(),
                }
                .into());
            }
            Err(RefreshError::Failed(source)) => {
                tracing::warn!(path = %request.path, error = %source, "Token refresh failed");
                return Err(AuthError {
                    kind: AuthErrorKind::RefreshFailed,
                    status: UNAUTHORIZED,
                    source,
                }
                .into());
            }
        };

        if let Err(e) = self.set_access_token(&token) {
            tracing::warn!(path = %request.path, "Refreshed token is not a valid header value");
            return Err(AuthError {
                kind: AuthErrorKind::RefreshFailed,
                status: UNAUTHORIZED,
                source: Box::new(e),
            }
            .into());
        }
        tracing::info!(path = %request.path, "Access token refreshed, re-sending request");

        let retried = ctx.run(self.send_once(&request, &url)).await??;
        self.finish(retried, true)
    }

    /// Sends a request and decodes the response body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`execute`](Self::execute), or
    /// [`ClientError::Decoding`] if the body does not match `T`.
    pub async fn execute_into<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        ctx: &RequestContext,
    ) -> Result<T, ClientError> {
        let response = self.execute(request, ctx).await?;
        Ok(response.json()?)
    }

    /// Sends a GET request and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`execute_into`](Self::execute_into).
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: &RequestContext,
    ) -> Result<T, ClientError> {
        let request = HttpRequest::builder(HttpMethod::Get, path).build()?;
        self.execute_into(&request, ctx).await
    }

    /// Sends a PUT request with a JSON body and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`execute_into`](Self::execute_into).
    pub async fn put<T, B>(&self, path: &str, body: &B, ctx: &RequestContext) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Put, path, body, ctx).await
    }

    /// Sends a PATCH request with a JSON body and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`execute_into`](Self::execute_into).
    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: &B,
        ctx: &RequestContext,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Patch, path, body, ctx).await
    }

    /// Sends a POST request with a JSON body and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`execute_into`](Self::execute_into).
    pub async fn post<T, B>(&self, path: &str, body: &B, ctx: &RequestContext) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Post, path, body, ctx).await
    }

    /// Sends a DELETE request, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute). A `404` surfaces as an error; use
    /// [`ClientError::is_not_found`] to treat it as already deleted.
    pub async fn delete(&self, path: &str, ctx: &RequestContext) -> Result<(), ClientError> {
        let request = HttpRequest::builder(HttpMethod::Delete, path).build()?;
        self.execute(&request, ctx).await?;
        Ok(())
    }

    async fn send_with_body<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        ctx: &RequestContext,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = HttpRequest::builder(method, path).json(body)?.build()?;
        self.execute_into(&request, ctx).await
    }

    /// Performs a single round trip. The body is serialized afresh each time.
    async fn send_once(
        &self,
        request: &HttpRequest,
        url: &reqwest::Url,
    ) -> Result<HttpResponse, ClientError> {
        let host = url.host_str().unwrap_or_default();

        // Extra headers replace defaults of the same name.
        let mut headers = HeaderMap::new();
        for (key, value) in &self.default_headers() {
            let (name, value) = wire_header(key, value)?;
            headers.insert(name, value);
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                let (name, value) = wire_header(key, value)?;
                headers.insert(name, value);
            }
        }

        let mut req_builder = self
            .client
            .request(request.method.into(), url.clone())
            .headers(headers);

        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        tracing::debug!(method = %request.method, url = %url, "Sending API request");

        let res = req_builder
            .send()
            .await
            .map_err(|e| ClientError::from_transport(host, e))?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body = res
            .text()
            .await
            .map_err(|e| ClientError::from_transport(host, e))?;

        tracing::debug!(status = code, url = %url, "Received API response");

        Ok(HttpResponse::new(code, res_headers, body))
    }

    fn finish(&self, response: HttpResponse, after_refresh: bool) -> Result<HttpResponse, ClientError> {
        if response.is_ok() {
            Ok(response)
        } else {
            Err(self.api_failure(response, after_refresh))
        }
    }

    /// Converts a non-2xx response into the caller-facing error.
    fn api_failure(&self, response: HttpResponse, after_refresh: bool) -> ClientError {
        let request_id = response.request_id().map(String::from);
        tracing::warn!(
            status = response.status,
            request_id = request_id.as_deref().unwrap_or("-"),
            after_refresh,
            "API request failed"
        );

        if let Some(on_error) = &self.on_error {
            if let Some(source) = on_error(response.status, &response.body) {
                return ClientError::Translated(TranslatedError {
                    status: response.status,
                    after_refresh,
                    source,
                });
            }
        }

        ClientError::Api(ApiError {
            status: response.status,
            body: response.body,
            request_id,
            after_refresh,
        })
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("token_refresher", &self.token_refresher.is_some())
            .field("before", &self.before.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
