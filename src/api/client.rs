//! The API client
//!
//! [`ApiClient::request`] runs one logical call as a small state machine:
//! `Attempting(n)` moves to `Succeeded` on a success envelope, back to
//! `Attempting(n + 1)` after a failure while the retry budget lasts, and to
//! `Failed` once it is spent. A fresh cache hit skips the machine entirely.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::envelope::{LogEntry, ResponsePayload, SuccessPayload};
use super::error::{ApiError, Result};
use super::transport::{ApiRequest, HttpTransport, Method, Transport};
use crate::config::ClientConfig;
use crate::storage::CacheStore;

/// Tracing target for diagnostic entries sent by the backend
const BACKEND_LOG_TARGET: &str = "warehouse::backend";

/// Per-call options for [`ApiClient::request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// JSON body for POST requests
    pub body: Option<Value>,
    /// Whether a GET may be answered from the cache
    pub use_cache: bool,
    /// Retries after the first attempt; `None` uses the client default
    pub retries: Option<u32>,
    /// Cached paths to invalidate after a successful POST
    pub invalidates: Vec<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            body: None,
            use_cache: true,
            retries: None,
            invalidates: Vec::new(),
        }
    }
}

impl RequestOptions {
    /// A cacheable GET
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST carrying `body`
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            use_cache: false,
            ..Default::default()
        }
    }

    /// Bypass the cache for this call
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Override the retry count for this call
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Invalidate `path` in the cache once this call succeeds
    pub fn invalidate(mut self, path: impl Into<String>) -> Self {
        self.invalidates.push(path.into());
        self
    }
}

/// Why a single attempt failed
#[derive(Debug)]
enum AttemptFailure {
    Transport(String),
    Backend(String),
}

impl AttemptFailure {
    fn message(&self) -> &str {
        match self {
            AttemptFailure::Transport(message) | AttemptFailure::Backend(message) => message,
        }
    }

    fn into_error(self, attempts: u32) -> ApiError {
        match self {
            AttemptFailure::Transport(message) => ApiError::Transport { message, attempts },
            AttemptFailure::Backend(message) => ApiError::Backend { message, attempts },
        }
    }
}

/// Progress of one logical call
enum AttemptState {
    Attempting(u32),
    Succeeded(SuccessPayload),
    Failed { failure: AttemptFailure, attempts: u32 },
}

/// Client for the warehouse backend
///
/// Cheap to clone; clones share the transport and the response cache.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    base_url: Url,
    transport: Arc<dyn Transport>,
    cache: Arc<CacheStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that talks HTTP to `config.base_url`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport with a fresh cache
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let cache = Arc::new(CacheStore::new(config.cache_ttl));
        Self::with_parts(config, transport, cache)
    }

    /// Create a client from explicit parts, e.g. to share one cache between clients
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<CacheStore>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            config: Arc::new(config),
            base_url,
            transport,
            cache,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The response cache backing GET requests
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Drops the cached response for `path`
    pub fn invalidate(&self, path: &str) {
        self.cache.clear_cache_item(path);
    }

    /// GET `path`, answering from the cache when possible
    pub async fn get(&self, path: &str) -> Result<SuccessPayload> {
        self.request(path, RequestOptions::get()).await
    }

    /// GET `path` from the network, refreshing the cache
    pub async fn get_fresh(&self, path: &str) -> Result<SuccessPayload> {
        self.request(path, RequestOptions::get().no_cache()).await
    }

    /// POST `body` to `path`
    pub async fn post(&self, path: &str, body: Value) -> Result<SuccessPayload> {
        self.request(path, RequestOptions::post(body)).await
    }

    /// Builds the URL for a logical path
    ///
    /// The part before the first `&` becomes the `path` query parameter; any
    /// remaining `key=value` pairs are appended as their own parameters.
    pub fn url_for(&self, path: &str) -> Url {
        let (endpoint, params) = split_path(path);
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("path", endpoint);
            for param in params.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = param.split_once('=').unwrap_or((param, ""));
                query.append_pair(key, value);
            }
        }
        url
    }

    /// Performs one logical request
    ///
    /// # Arguments
    /// * `path` - Logical endpoint (e.g. "katalog"), also the cache key
    /// * `options` - Method, body, cache and retry settings
    ///
    /// # Returns
    /// * `Ok(SuccessPayload)` - From the cache or the first successful attempt
    /// * `Err(ApiError)` - Carrying the last failure message once retries are spent
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<SuccessPayload> {
        if options.method == Method::Get && options.use_cache {
            if let Some(payload) = self.cache.get_cache::<SuccessPayload>(path) {
                debug!(path, "served from cache");
                return Ok(payload);
            }
        }

        let request = self.build_request(path, &options)?;
        let max_attempts = options
            .retries
            .unwrap_or(self.config.retries)
            .saturating_add(1);

        let mut state = AttemptState::Attempting(1);
        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    debug!(
                        path,
                        method = %options.method,
                        attempt,
                        max_attempts,
                        "sending request"
                    );
                    match self.attempt(path, &request).await {
                        Ok(payload) => AttemptState::Succeeded(payload),
                        Err(failure) => {
                            warn!(
                                path,
                                attempt,
                                max_attempts,
                                error = failure.message(),
                                "request attempt failed"
                            );
                            let give_up = attempt >= max_attempts
                                || (matches!(failure, AttemptFailure::Backend(_))
                                    && !self.config.retry_backend_errors);
                            if give_up {
                                AttemptState::Failed {
                                    failure,
                                    attempts: attempt,
                                }
                            } else {
                                tokio::time::sleep(self.backoff(attempt)).await;
                                AttemptState::Attempting(attempt + 1)
                            }
                        }
                    }
                }
                AttemptState::Succeeded(payload) => {
                    self.record_success(path, &options, &payload);
                    return Ok(payload);
                }
                AttemptState::Failed { failure, attempts } => {
                    return Err(failure.into_error(attempts));
                }
            };
        }
    }

    /// Delay before the attempt following `attempt`
    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_base_delay.saturating_mul(attempt)
    }

    fn build_request(&self, path: &str, options: &RequestOptions) -> Result<ApiRequest> {
        let body = match options.method {
            Method::Get if options.body.is_some() => return Err(ApiError::InvalidBody),
            Method::Get => None,
            Method::Post => Some(encode_body(path, options.body.as_ref())?),
        };

        Ok(ApiRequest {
            method: options.method,
            url: self.url_for(path),
            body,
        })
    }

    async fn attempt(
        &self,
        path: &str,
        request: &ApiRequest,
    ) -> std::result::Result<SuccessPayload, AttemptFailure> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;

        if !response.status.is_success() {
            return Err(AttemptFailure::Transport(format!(
                "Server responded with {}",
                response.status
            )));
        }

        let payload = ResponsePayload::parse(&response.body)
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;
        surface_backend_logs(path, payload.logs());

        match payload {
            ResponsePayload::Success(payload) => Ok(payload),
            ResponsePayload::Error { message, .. } => Err(AttemptFailure::Backend(message)),
        }
    }

    fn record_success(&self, path: &str, options: &RequestOptions, payload: &SuccessPayload) {
        match options.method {
            Method::Get => {
                if let Err(err) = self.cache.set_cache(path, payload) {
                    warn!(path, error = %err, "failed to cache response");
                }
            }
            Method::Post => {
                for stale in &options.invalidates {
                    self.cache.clear_cache_item(stale);
                }
            }
        }
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.split_once('&').unwrap_or((path, ""))
}

/// Serializes a POST body, making sure it names its endpoint
fn encode_body(path: &str, body: Option<&Value>) -> Result<String> {
    let mut object = match body {
        None => serde_json::Map::new(),
        Some(Value::Object(object)) => object.clone(),
        Some(_) => return Err(ApiError::InvalidBody),
    };
    let (endpoint, _) = split_path(path);
    object
        .entry("path")
        .or_insert_with(|| Value::String(endpoint.to_string()));

    Ok(Value::Object(object).to_string())
}

fn surface_backend_logs(path: &str, logs: &[LogEntry]) {
    for entry in logs {
        match &entry.data {
            Some(data) => {
                info!(target: BACKEND_LOG_TARGET, path, data = %data, "{}", entry.message)
            }
            None => info!(target: BACKEND_LOG_TARGET, path, "{}", entry.message),
        }
    }
}
