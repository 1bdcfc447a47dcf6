//! Request/cache/retry layer for the warehouse backend
//!
//! Every network call goes through [`ApiClient::request`], which consults the
//! session cache for GETs, retries failed attempts with linear backoff, and
//! turns the backend's status-tagged envelope into a typed result.

mod client;
mod envelope;
mod error;
mod transport;

pub use client::{ApiClient, RequestOptions};
pub use envelope::{EnvelopeError, LogEntry, ResponsePayload, SuccessPayload, DEFAULT_ERROR_MESSAGE};
pub use error::{ApiError, Result};
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport, TransportError};
