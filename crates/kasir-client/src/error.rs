//! # Client Error Types
//!
//! Error types for backend calls, configuration and session storage.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  HTTP Status    │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Unauthorized   │  │  Transport      │  │  Decode                 │ │
//! │  │  Forbidden      │  │  Timeout        │  │  Rejected (success:     │ │
//! │  │  NotFound       │  │  InvalidUrl     │  │           false)        │ │
//! │  │  Conflict       │  │                 │  │                         │ │
//! │  │  Validation     │  │                 │  │                         │ │
//! │  │  Server         │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  ConfigError    │  │  Storage        │                              │
//! │  │  kasir.toml     │  │  session.json   │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure of a call to the REST backend.
///
/// ## Design Principles
/// - HTTP status classes map to their own variant
/// - The backend's `error` text is kept so the cashier sees the real reason
/// - A failed call never touches the cart; the caller decides what to do
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    // =========================================================================
    // HTTP Status Errors
    // =========================================================================
    /// 401: the token is missing, expired or revoked.
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// 403: the user may not act on this store.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404: product, customer or transaction not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409: duplicate or stale resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 400/422: the backend refused the request body
    /// (insufficient stock, insufficient payment once tax is added, ...).
    #[error("Rejected by backend: {0}")]
    Validation(String),

    /// 5xx or an unexpected status.
    #[error("Backend error ({status}): {message}")]
    Server { status: u16, message: String },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, DNS failure, TLS failure.
    #[error("Network error: {0}")]
    Transport(String),

    /// The request did not finish within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The base URL or an endpoint could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// The response body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// 2xx with `success: false` in the envelope.
    #[error("{0}")]
    Rejected(String),

    // =========================================================================
    // Local Storage
    // =========================================================================
    /// Reading or writing the session file failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Maps a non-success HTTP status and the backend's message to a variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            400 | 422 => ClientError::Validation(message),
            _ => ClientError::Server { status, message },
        }
    }

    /// Returns true if the same request may succeed when retried.
    ///
    /// ## Retryable Errors
    /// - Network failures and timeouts
    /// - 5xx responses
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout => true,
            ClientError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the stored session must be dropped.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Failure while loading, validating or saving `kasir.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("No config directory available on this platform")]
    NoConfigPath,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        ConfigError::InvalidUrl(err.to_string())
    }
}
