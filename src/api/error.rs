//! Error types for the API client

use thiserror::Error;

/// Result type alias for API client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by [`ApiClient`](super::ApiClient)
///
/// The two request variants display the bare failure message so callers can
/// show it to the user as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Every attempt failed; the last one at the network, HTTP, or parse level
    #[error("{message}")]
    Transport { message: String, attempts: u32 },

    /// Every attempt failed; the last one was reported by the backend
    #[error("{message}")]
    Backend { message: String, attempts: u32 },

    /// The base URL or request path does not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// A request body was given that cannot be sent
    #[error("Request body must be a JSON object sent with POST")]
    InvalidBody,
}

impl ApiError {
    /// Number of network attempts made before failing (0 if none were made)
    pub fn attempts(&self) -> u32 {
        match self {
            ApiError::Transport { attempts, .. } | ApiError::Backend { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Whether the final failure was reported by the backend
    pub fn is_backend(&self) -> bool {
        matches!(self, ApiError::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_bare_message() {
        let err = ApiError::Backend {
            message: "Stok tidak cukup".to_string(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "Stok tidak cukup");
        assert_eq!(err.attempts(), 3);
        assert!(err.is_backend());
    }

    #[test]
    fn test_invalid_body_has_no_attempts() {
        let err = ApiError::InvalidBody;
        assert_eq!(err.attempts(), 0);
        assert!(!err.is_backend());
    }
}
