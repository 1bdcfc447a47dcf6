//! Warehouse client library
//!
//! Exposes the API client, its storage layers, and the CLI definitions so the
//! binary and the integration tests share one implementation.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod storage;

pub use api::{ApiClient, ApiError, Method, RequestOptions, SuccessPayload};
pub use config::ClientConfig;
pub use storage::{CacheStore, DurableStore};
