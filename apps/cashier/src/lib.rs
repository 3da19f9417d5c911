//! # Kasir Cashier Library
//!
//! The register application: session state, commands and the console.
//!
//! ## Module Organization
//! ```text
//! kasir_cashier/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── session.rs      ◄─── PosSession: backend + state, injected everywhere
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── auth.rs     ◄─── Token and signed-in user
//! │   ├── cart.rs     ◄─── Cart behind Arc<Mutex>
//! │   └── outlet.rs   ◄─── Known stores and the active one
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── auth.rs     ◄─── Login, logout, store selection
//! │   ├── cart.rs     ◄─── Scanning and cart editing
//! │   └── sale.rs     ◄─── Checkout, payment, receipt
//! ├── console.rs      ◄─── Line commands over stdin
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod console;
pub mod error;
pub mod session;
pub mod state;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kasir_client::{ClientConfig, HttpBackend, SessionStore};

use console::Console;
use error::ApiResult;
use session::PosSession;

/// Runs the cashier console.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter (RUST_LOG)                     │
/// │                                                                         │
/// │  2. Load Config ──────────────────────────────────────────────────────► │
/// │     • defaults → kasir.toml → KASIR_* env → validate                    │
/// │                                                                         │
/// │  3. Build Backend ────────────────────────────────────────────────────► │
/// │     • HttpBackend (reqwest, configured timeout)                         │
/// │                                                                         │
/// │  4. Restore Session ──────────────────────────────────────────────────► │
/// │     • session.json: token, user, active store                           │
/// │     • the cart always starts empty                                      │
/// │                                                                         │
/// │  5. Read Commands ────────────────────────────────────────────────────► │
/// │     • stdin lines until 'quit' or EOF                                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ApiResult<()> {
    init_tracing();

    info!("Starting Kasir POS cashier");

    let config = ClientConfig::load(None)?;
    info!(api = %config.api.base_url, currency = %config.currency.code, "Config loaded");

    let backend = HttpBackend::new(&config)?;
    let mut session = PosSession::new(backend, config.clone());
    match SessionStore::from_config(&config) {
        Some(store) => {
            info!(path = ?store.path(), "Session file");
            session = session.with_session_store(store);
        }
        None => warn!("No data directory, the login will not be remembered"),
    }

    if let Err(e) = session.restore() {
        warn!(error = %e, "Could not restore the previous session");
    }

    Console::new(session).run_stdin().await?;

    info!("Cashier closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kasir=trace` - Show trace for kasir crates only
/// - Default: INFO, DEBUG for kasir crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kasir=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
