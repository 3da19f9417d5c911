//! # Commands Module
//!
//! Every action the cashier can take, as plain async functions over a
//! [`PosSession`](crate::session::PosSession).
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── auth.rs     ◄─── Login, logout, store selection
//! ├── cart.rs     ◄─── Scanning, quantities, discounts, customers
//! └── sale.rs     ◄─── Checkout, payment, receipt delivery
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  1. Validate input            (kasir_core::validation)                  │
//! │  2. Resolve token + store     (session.context(), NOT_AUTHENTICATED /   │
//! │                                NO_STORE on failure)                     │
//! │  3. Call the backend          (no cart lock held)                       │
//! │  4. Apply the result          (session.cart.with_cart_mut)              │
//! │  5. Return a response DTO     (or ApiError)                             │
//! │                                                                         │
//! │  Any failure before step 4 leaves the cart exactly as it was.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod cart;
pub mod sale;
