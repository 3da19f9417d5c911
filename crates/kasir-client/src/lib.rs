//! # kasir-client: Backend Access for Kasir POS
//!
//! Everything between the cart engine and the REST backend: configuration,
//! wire DTOs, the `PosBackend` seam, and the on-disk session.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         kasir-client                                    │
//! │                                                                         │
//! │   ClientConfig ── defaults → kasir.toml → KASIR_* env → validate        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 PosBackend (async trait)                         │  │
//! │  │   login · stores · products · customers · transactions · receipt │  │
//! │  └───────────────┬──────────────────────────────┬───────────────────┘  │
//! │                  ▼                              ▼                       │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────┐    │
//! │  │ HttpBackend                │  │ InMemoryBackend                │    │
//! │  │ reqwest + bearer token     │  │ seeded stores/products         │    │
//! │  │ Envelope<T> → Dto → domain │  │ server-side pricing + tax      │    │
//! │  └────────────────────────────┘  └────────────────────────────────┘    │
//! │                                                                         │
//! │   SessionStore ── session.json (token, user, active store)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`backend`] - `PosBackend` trait and the REST implementation
//! - [`config`] - Client configuration and currency formatting
//! - [`error`] - Client and config error types
//! - [`memory`] - In-memory backend for tests and demos
//! - [`session_store`] - Persisted sign-in and outlet selection
//! - [`wire`] - JSON envelope and DTOs of the REST API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_client::{ClientConfig, HttpBackend, PosBackend};
//!
//! let config = ClientConfig::load_or_default(None);
//! let backend = HttpBackend::new(&config)?;
//!
//! let auth = backend.login("kasir@toko.id", "rahasia").await?;
//! let stores = backend.list_stores(&auth.token).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod session_store;
pub mod wire;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{HttpBackend, PosBackend};
pub use config::{format_money, ApiSettings, ClientConfig, CurrencyFormat, SessionSettings};
pub use error::{ClientError, ClientResult, ConfigError, ConfigResult};
pub use memory::InMemoryBackend;
pub use session_store::{AuthSession, PersistedSession, SessionStore};
pub use wire::Page;
