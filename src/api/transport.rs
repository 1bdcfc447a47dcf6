//! Network transport used by the API client
//!
//! The [`Transport`] trait is the only place the client touches the network.
//! [`HttpTransport`] is the reqwest-backed implementation; tests substitute
//! their own.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Content type for request bodies; the script backend rejects CORS-preflighted
/// JSON content types, so bodies go out as plain text.
const BODY_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// HTTP method of a logical request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully-built request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    /// Serialized JSON body (POST only)
    pub body: Option<String>,
}

/// Status and body of a settled HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// Errors that prevent a response from arriving at all
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

/// Sends requests to the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and waits for it to settle
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose attempts time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, BODY_CONTENT_TYPE)
                .body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
