//! # kasir-core: Cart & Checkout Engine for Kasir POS
//!
//! This crate holds the part of the cashier that must be exact: cart
//! arithmetic, discount composition and change calculation. It has no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/cashier (kasir-cashier)                    │   │
//! │  │    console ──► commands ──► PosSession (auth, outlet, cart)     │   │
//! │  └──────────────────┬──────────────────────────────┬───────────────┘   │
//! │                     │                              │                    │
//! │  ┌──────────────────▼──────────────────┐  ┌────────▼────────────────┐  │
//! │  │     ★ kasir-core (THIS CRATE) ★     │  │     kasir-client        │  │
//! │  │                                     │  │  PosBackend trait       │  │
//! │  │  money   types   cart   checkout    │  │  HttpBackend (reqwest)  │  │
//! │  │  validation      error              │  │  config, session store  │  │
//! │  │                                     │  └────────┬────────────────┘  │
//! │  │  NO I/O • NO NETWORK • PURE         │           │ REST + JSON        │
//! │  └─────────────────────────────────────┘  ┌────────▼────────────────┐  │
//! │                                           │    Kasir REST backend   │  │
//! │                                           └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type in integer minor units
//! - [`types`] - Domain types (Product, Customer, Discount, PaymentType, ...)
//! - [`cart`] - The cart engine and its checkout phases
//! - [`checkout`] - Settlement validation and the transaction request body
//! - [`validation`] - Input validation for scanner and cashier input
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::{Cart, Money, Product};
//! use kasir_core::checkout::validate_settlement;
//! use uuid::Uuid;
//!
//! let beras = Product {
//!     id: Uuid::new_v4(),
//!     name: "Beras 1kg".to_string(),
//!     barcode: Some("8991234567890".to_string()),
//!     sku: None,
//!     category_id: None,
//!     category_name: None,
//!     price: Money::from_minor(10_000),
//!     cost: Money::from_minor(8_500),
//!     stock: 40,
//!     min_stock: 10,
//!     unit: "pcs".to_string(),
//!     is_active: true,
//!     track_stock: true,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(beras).unwrap();
//! cart.begin_checkout().unwrap();
//! cart.set_payment_amount(Money::from_minor(20_000));
//!
//! assert!(validate_settlement(&cart).is_ok());
//! assert_eq!(cart.change().minor(), 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kasir_core::Cart` instead of
// `use kasir_core::cart::Cart`

pub use cart::{Cart, CartLine, CartPhase, CartTotals, MAX_LINE_QUANTITY};
pub use checkout::{ReceiptRequest, TransactionItemRequest, TransactionRequest};
pub use error::{CartError, CheckoutError, ValidationError};
pub use money::Money;
pub use types::*;
