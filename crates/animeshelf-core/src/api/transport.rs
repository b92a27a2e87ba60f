//! HTTP transport for the session client.
//!
//! `Transport` is the seam between the retry logic in `SessionClient` and the
//! wire. `HttpTransport` is the real implementation: a `reqwest::Client` with
//! a cookie store, so the backend can set and read the session cookies
//! without this crate ever touching token bytes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::ApiError;

/// A single outbound call. Cloned (never mutated) when re-issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Zero for the first send, incremented on the clone that gets re-issued.
    pub attempt: u32,
    /// Whether a `TOKEN_EXPIRED` answer may trigger refresh-and-retry.
    pub retry_on_expiry: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            attempt: 0,
            retry_on_expiry: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Opt this request out of the refresh-and-retry rule.
    pub fn without_retry(mut self) -> Self {
        self.retry_on_expiry = false;
        self
    }

    /// The copy to re-issue after a successful refresh.
    pub fn retried(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }
}

/// Raw status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a classified error.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }

    /// Parse the body as JSON. An empty body parses as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = if self.body.trim().is_empty() {
            "{}"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed transport with credentials (cookies) on every call.
/// Clone is cheap - reqwest::Client uses Arc internally, so clones share
/// the connection pool and the cookie jar.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Resolve an API path against the base URL, keeping any base path prefix.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid endpoint {}: {}", joined, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(&request.path)?;
        debug!(method = %request.method, %url, attempt = request.attempt, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, path = %request.path, "Response received");

        Ok(ApiResponse { status, body })
    }
}
