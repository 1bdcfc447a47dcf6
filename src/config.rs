//! Client configuration and well-known constants
//!
//! Defaults mirror the values the warehouse web app ships with: a five minute
//! response cache, three total attempts per request, and a 15 second
//! transport timeout.

use std::time::Duration;

/// Deployed backend endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = concat!(
    "https://script.google.com/macros/s/",
    "AKfycbzL0CusSVjw4pNgevXAkYQ5oxTyyGcFMreSKOn-MIbiewvpgglFHQlprk6Kcr-fJPz6",
    "/exec"
);

/// Keys used in the durable store
pub mod storage_keys {
    pub const USER: &str = "warehouse_app_user";
    pub const CART: &str = "warehouse_app_cart";
    pub const LAST_TRANSACTION: &str = "warehouse_app_last_transaction";
    pub const LAST_TRANSACTION_DATE: &str = "warehouse_app_last_transaction_date";
    pub const USER_FOR_INVOICE: &str = "warehouse_app_user_for_invoice";

    /// Every well-known key, in declaration order
    pub const ALL: [&str; 5] = [
        USER,
        CART,
        LAST_TRANSACTION,
        LAST_TRANSACTION_DATE,
        USER_FOR_INVOICE,
    ];
}

/// Configuration for an [`ApiClient`](crate::api::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend script endpoint
    pub base_url: String,
    /// How long a cached GET response stays valid
    pub cache_ttl: Duration,
    /// Retries after the first attempt (total attempts = retries + 1)
    pub retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_base_delay` before the next one
    pub retry_base_delay: Duration,
    /// Transport-level timeout for a single attempt
    pub request_timeout: Duration,
    /// Whether backend-reported errors consume the retry budget
    pub retry_backend_errors: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(5 * 60),
            retries: 2,
            retry_base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(15),
            retry_backend_errors: true,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the default retry count
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the linear backoff unit
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the per-attempt transport timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Choose whether backend-reported errors are retried like transport errors
    pub fn with_retry_backend_errors(mut self, retry: bool) -> Self {
        self.retry_backend_errors = retry;
        self
    }
}
