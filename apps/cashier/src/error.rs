//! # API Error Type
//!
//! Unified error type for cashier commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kasir POS                              │
//! │                                                                         │
//! │  Console / UI                Rust Backend                               │
//! │  ────────────                ────────────                               │
//! │                                                                         │
//! │  scan 899100                                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  ApiResult<T>                                                    │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad input?   ─── ValidationError ────────────┐                  │  │
//! │  │  Cart locked? ─── CartError::Frozen ──────────┤                  │  │
//! │  │  Short cash?  ─── CheckoutError ──────────────┼──► ApiError ────►│  │
//! │  │  Backend?     ─── ClientError (401, 404, ...) ┘                  │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  e.code    = "NOT_FOUND"                                                │
//! │  e.message = "Not found: Product not found"                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed command never leaves the cart half-changed, so the cashier can
//! simply retry.

use serde::Serialize;
use thiserror::Error;

use kasir_client::{ClientError, ConfigError};
use kasir_core::{CartError, CheckoutError, ValidationError};

/// API error returned from cashier commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_PAYMENT",
///   "message": "Insufficient payment: Rp 15.000 tendered, Rp 18.000 due"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, customer, store or transaction not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// No signed-in user, or the backend rejected the token
    NotAuthenticated,

    /// A store-scoped command ran before an outlet was selected
    NoStore,

    /// The user may not act on this store
    Forbidden,

    /// Line or discount change while payment is being taken
    CartFrozen,

    /// Cart operation failed (empty cart, wrong phase)
    CartError,

    /// Tendered amount below the total
    InsufficientPayment,

    /// The backend refused the request (stock, payment after tax, ...)
    Rejected,

    /// Backend unreachable or too slow
    Network,

    /// Backend failed or answered with something unreadable
    BackendError,

    /// Invalid or unreadable configuration
    ConfigError,

    /// The session file could not be read or written
    StorageError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn not_authenticated() -> Self {
        ApiError::new(ErrorCode::NotAuthenticated, "Please log in first")
    }

    pub fn no_store() -> Self {
        ApiError::new(ErrorCode::NoStore, "Select a store first")
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Frozen => ApiError::new(ErrorCode::CartFrozen, err.to_string()),
            CartError::QuantityLimit { .. } => ApiError::validation(err.to_string()),
            CartError::Empty | CartError::WrongPhase { .. } => {
                ApiError::new(ErrorCode::CartError, err.to_string())
            }
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => ApiError::new(ErrorCode::CartError, err.to_string()),
            CheckoutError::InsufficientPayment { .. } => {
                ApiError::new(ErrorCode::InsufficientPayment, err.to_string())
            }
            CheckoutError::NegativeTotal { .. } => ApiError::validation(err.to_string()),
            CheckoutError::Cart(e) => e.into(),
            CheckoutError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts backend errors to API errors.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::Unauthorized => ApiError::new(ErrorCode::NotAuthenticated, message),
            ClientError::Forbidden(_) => ApiError::new(ErrorCode::Forbidden, message),
            ClientError::NotFound(_) => ApiError::new(ErrorCode::NotFound, message),
            ClientError::Conflict(_) | ClientError::Validation(_) | ClientError::Rejected(_) => {
                ApiError::new(ErrorCode::Rejected, message)
            }
            ClientError::Transport(_) | ClientError::Timeout => {
                ApiError::new(ErrorCode::Network, message)
            }
            ClientError::Server { .. } | ClientError::Decode(_) => {
                tracing::error!(error = %message, "Backend failure");
                ApiError::new(ErrorCode::BackendError, message)
            }
            ClientError::InvalidUrl(_) => ApiError::new(ErrorCode::ConfigError, message),
            ClientError::Storage(_) => ApiError::new(ErrorCode::StorageError, message),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}
