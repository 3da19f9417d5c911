//! # State Module
//!
//! Session state for the cashier app, split into focused types so each
//! command touches only what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 PosSession<B: PosBackend>                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │  AuthState   │  │  CartState   │  │   OutletState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  token       │  │  Arc<Mutex<  │  │  known stores    │              │
//! │  │  user        │  │    Cart      │  │  active store    │              │
//! │  │  expiry      │  │  >>          │  │                  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │     persisted          volatile          persisted                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every lock is taken and released inside a synchronous closure; no guard
//! lives across an `.await`.

mod auth;
mod cart;
mod outlet;

pub use auth::AuthState;
pub use cart::{CartState, SubmissionGuard};
pub use outlet::OutletState;
