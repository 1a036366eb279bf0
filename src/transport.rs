//! HTTP transport with retry
//!
//! [`Transport`] is the seam between the pipeline and the network. The
//! production implementation, [`HttpTransport`], wraps a `reqwest` client and
//! runs every request through [`with_retry`](crate::retry::with_retry); a
//! request either yields a 2xx [`HttpResponse`] or a [`TransportFailure`]
//! carrying the number of attempts and the last error.

use crate::config::{ApiConfig, RetryConfig};
use crate::error::{Error, Result, TransportError, TransportFailure};
use crate::retry::with_retry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// HTTP method used by the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// GET (file downloads)
    Get,
    /// POST with a JSON body (verdict search)
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request description, independent of the HTTP client
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// JSON body (POST only)
    pub body: Option<serde_json::Value>,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl HttpRequest {
    /// GET `url` with the given per-attempt timeout
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
            timeout,
        }
    }

    /// POST `body` as JSON to `url`
    pub fn post_json(url: impl Into<String>, body: serde_json::Value, timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
            timeout,
        }
    }
}

/// A successful (2xx) response with its full body
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
    /// Number of attempts it took
    pub attempts: u32,
}

/// Performs HTTP requests on behalf of the pipeline
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request`, retrying transient failures
    async fn request(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportFailure>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Build a transport sending the configured default headers
    pub fn new(api: &ApiConfig, retry: RetryConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("*/*"),
        );
        if let Some(referer) = &api.referer {
            let value = reqwest::header::HeaderValue::from_str(referer)
                .map_err(|e| Error::config("api.referer", e.to_string()))?;
            headers.insert(reqwest::header::REFERER, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(api.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config("api", format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, retry })
    }

    async fn attempt(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, &e))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            body: body.to_vec(),
            attempts: 0,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportFailure> {
        let attempts = AtomicU32::new(0);

        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let result = with_retry(&self.retry, || {
            attempts.fetch_add(1, Ordering::Relaxed);
            self.attempt(request)
        })
        .await;

        match result {
            Ok(mut response) => {
                response.attempts = attempts.load(Ordering::Relaxed);
                Ok(response)
            }
            Err(last) => Err(TransportFailure {
                attempts: attempts.load(Ordering::Relaxed),
                last,
            }),
        }
    }
}
