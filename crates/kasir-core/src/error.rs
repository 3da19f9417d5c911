//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CartError        - Phase violations on the cart engine            │
//! │  ├── CheckoutError    - Settlement rejected before any I/O             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-client errors (separate crate)                                  │
//! │  └── ClientError      - REST/transport failures                        │
//! │                                                                         │
//! │  cashier app errors                                                    │
//! │  └── ApiError         - What the cashier sees (code + message)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of the derivations (subtotal, total, change) can fail. Errors here
//! only describe operations that were refused, and a refused operation
//! never leaves the cart half-modified.

use thiserror::Error;

use crate::cart::CartPhase;
use crate::money::Money;

// =============================================================================
// Cart Error
// =============================================================================

/// A cart operation refused by the checkout phase or a line limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The cart is frozen while payment is being taken.
    ///
    /// ## User Workflow
    /// ```text
    /// Payment dialog open (AWAITING_PAYMENT)
    ///      │
    ///      ▼
    /// Cashier scans another item
    ///      │
    ///      ▼
    /// CartError::Frozen ──► "Close the payment dialog to edit the cart"
    /// ```
    #[error("Cart is locked for payment; resume editing to change it")]
    Frozen,

    /// Checkout requested on a cart without lines.
    #[error("Cart is empty")]
    Empty,

    /// A line quantity above the per-line maximum.
    #[error("Quantity must be at most {max}")]
    QuantityLimit { max: i64 },

    /// The operation needs a different phase.
    #[error("Cart is {actual:?}, expected {expected:?}")]
    WrongPhase {
        expected: CartPhase,
        actual: CartPhase,
    },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Reasons a settlement is rejected before the transaction is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// Tendered amount does not cover the total.
    #[error("Insufficient payment: {tendered} tendered, {due} due")]
    InsufficientPayment { due: Money, tendered: Money },

    /// Discounts exceed the subtotal.
    #[error("Total is negative ({total}); reduce the discount")]
    NegativeTotal { total: Money },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any cart mutation or request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. a phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CartResult<T> = Result<T, CartError>;

pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
