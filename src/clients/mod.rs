//! HTTP client types for cloud API communication.
//!
//! This module provides the generic client layer every resource handler
//! builds on: endpoint resolution, authenticated request execution with a
//! single token-refresh retry, cursor pagination, and a structured error
//! taxonomy.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiClient`]: The async request executor
//! - [`HttpRequest`]: A request relative to the resolved base URL
//! - [`HttpResponse`]: The status, headers and raw body of a response
//! - [`HttpMethod`]: Supported HTTP methods (GET, PUT, PATCH, POST, DELETE)
//! - [`RequestContext`]: Cancellation and deadline for one logical call
//! - [`EndpointResolver`] / [`DynamicEndpoint`]: Where requests are sent
//! - [`PaginatedResources`]: The envelope of one collection page
//! - [`ClientError`] / [`PaginationError`]: What can go wrong
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_api::{ApiClient, BaseUrl};
//! use cloud_api::clients::{HttpMethod, HttpRequest, RequestContext};
//!
//! let client = ApiClient::new(BaseUrl::new("https://api.example.com")?, None)?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "/v2/info").build()?;
//! let response = client.execute(&request, &RequestContext::new()).await?;
//! println!("{}", response.body);
//! ```
//!
//! # Retry Behavior
//!
//! The only retry is the one after a successful token refresh:
//!
//! - **401 with a token refresher**: refresh once, re-send once, return that outcome
//! - **401 without a refresher**: returned as an [`ApiError`]
//! - **Network errors and other statuses**: returned immediately

mod context;
mod endpoint;
mod errors;
mod hooks;
mod http_client;
mod http_request;
mod http_response;
mod pagination;
mod path;

pub use context::RequestContext;
pub use endpoint::{DynamicEndpoint, EndpointResolver};
pub use errors::{
    ApiError, AuthError, AuthErrorKind, BoxError, CancelReason, ClientError, DecodingError,
    InvalidHttpRequestError, NetworkError, PaginationError, TranslatedError,
};
pub use hooks::{BeforeHook, ErrorHook};
pub use http_client::{ApiClient, AUTHORIZATION_HEADER, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;
pub use pagination::PaginatedResources;
pub use path::{clean_path, compose};
