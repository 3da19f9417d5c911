//! # POS Session
//!
//! One register's worth of state plus the backend it talks to. Constructed
//! explicitly and passed to every command, so tests can run many sessions
//! side by side against their own in-memory backends.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ PosSession<B>                                                │
//! │   backend: B ─────────────► HttpBackend | InMemoryBackend    │
//! │   config:  ClientConfig     (currency, per_page)             │
//! │   auth, outlet ───────────► session.json (SessionStore)      │
//! │   cart                      (volatile)                       │
//! │   last_sale                 (receipt target)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use kasir_client::{ClientConfig, ClientError, PersistedSession, PosBackend, SessionStore};
use kasir_core::{Store, Transaction};

use crate::error::{ApiError, ApiResult};
use crate::state::{AuthState, CartState, OutletState};

/// The last transaction settled in this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettledSale {
    pub transaction: Transaction,
    /// Phone of the customer linked at settlement, the default receipt target.
    pub customer_phone: Option<String>,
}

pub struct PosSession<B> {
    backend: B,
    config: ClientConfig,
    session_store: Option<SessionStore>,
    pub auth: AuthState,
    pub outlet: OutletState,
    pub cart: CartState,
    last_sale: Mutex<Option<SettledSale>>,
}

impl<B: PosBackend> PosSession<B> {
    /// A signed-out session that persists nothing.
    pub fn new(backend: B, config: ClientConfig) -> Self {
        PosSession {
            backend,
            config,
            session_store: None,
            auth: AuthState::new(),
            outlet: OutletState::new(),
            cart: CartState::new(),
            last_sale: Mutex::new(None),
        }
    }

    /// Persists auth and outlet changes to `store`.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Loads the saved session, skipping an expired token.
    pub fn restore(&self) -> ApiResult<()> {
        let Some(store) = &self.session_store else {
            return Ok(());
        };
        let saved = store.load()?;

        if let Some(auth) = saved.auth {
            if auth.is_expired_at(chrono::Utc::now()) {
                info!(user = %auth.user.email, "Saved session expired, signing out");
            } else {
                info!(user = %auth.user.email, "Session restored");
                self.auth.set(auth);
                if let Some(outlet) = saved.store {
                    self.outlet.restore(outlet);
                }
            }
        }
        Ok(())
    }

    /// Writes auth and active store to disk.
    ///
    /// Failing to save is logged and otherwise ignored: the register keeps
    /// working, it just won't remember the login on restart.
    pub fn persist(&self) {
        let Some(store) = &self.session_store else {
            return;
        };
        let snapshot = PersistedSession {
            auth: self.auth.snapshot(),
            store: self.outlet.active(),
        };

        let result = if snapshot.auth.is_none() {
            store.clear()
        } else {
            store.save(&snapshot)
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }

    // =========================================================================
    // Backend Access
    // =========================================================================

    pub fn token(&self) -> ApiResult<String> {
        self.auth.require_token()
    }

    /// Token and active store, in that order of checks.
    pub fn context(&self) -> ApiResult<(String, Store)> {
        let token = self.token()?;
        let store = self.outlet.require_store()?;
        Ok((token, store))
    }

    /// Converts a backend result, signing out on 401.
    pub fn guard<T>(&self, result: Result<T, ClientError>) -> ApiResult<T> {
        result.map_err(|err| {
            if err.is_auth_error() {
                warn!("Backend rejected the session token, signing out");
                self.sign_out();
            }
            ApiError::from(err)
        })
    }

    /// Forgets the user, the outlet and the open cart.
    pub fn sign_out(&self) {
        self.auth.clear();
        self.outlet.clear();
        self.cart.with_cart_mut(|c| c.clear());
        self.persist();
    }

    // =========================================================================
    // Last Sale
    // =========================================================================

    pub fn last_sale(&self) -> Option<SettledSale> {
        self.last_sale
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn record_sale(&self, sale: SettledSale) {
        *self.last_sale.lock().unwrap_or_else(PoisonError::into_inner) = Some(sale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use kasir_client::InMemoryBackend;
    use kasir_core::Percentage;
    use uuid::Uuid;

    fn temp_store() -> SessionStore {
        let dir = std::env::temp_dir().join(format!("kasir-cashier-{}", Uuid::new_v4()));
        SessionStore::new(dir.join("session.json"))
    }

    #[tokio::test]
    async fn test_context_checks_auth_then_store() {
        let backend = InMemoryBackend::new();
        backend.add_account("kasir@toko.id", "rahasia", "Rina");
        let session = PosSession::new(backend.clone(), ClientConfig::default());

        assert_eq!(session.context().unwrap_err().code, ErrorCode::NotAuthenticated);

        let auth = backend.login("kasir@toko.id", "rahasia").await.unwrap();
        session.auth.set(auth);
        assert_eq!(session.context().unwrap_err().code, ErrorCode::NoStore);
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let backend = InMemoryBackend::new();
        backend.add_account("kasir@toko.id", "rahasia", "Rina");
        let store = backend.add_store("Toko Makmur", Percentage::zero());
        let file = temp_store();

        let first = PosSession::new(backend.clone(), ClientConfig::default())
            .with_session_store(file.clone());
        first.auth.set(backend.login("kasir@toko.id", "rahasia").await.unwrap());
        first.outlet.restore(store.clone());
        first.persist();

        let second =
            PosSession::new(backend, ClientConfig::default()).with_session_store(file.clone());
        second.restore().unwrap();
        assert!(second.auth.is_authenticated());
        assert_eq!(second.outlet.active().unwrap().id, store.id);

        second.sign_out();
        assert!(!file.path().exists());
    }

    #[test]
    fn test_guard_signs_out_on_unauthorized() {
        let session = PosSession::new(InMemoryBackend::new(), ClientConfig::default());
        session.auth.set(kasir_client::AuthSession {
            token: "stale".to_string(),
            user: kasir_core::User {
                id: Uuid::new_v4(),
                email: "kasir@toko.id".to_string(),
                full_name: "Rina".to_string(),
                role: "cashier".to_string(),
                phone: None,
            },
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        });

        let err = session
            .guard::<()>(Err(ClientError::Unauthorized))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert!(!session.auth.is_authenticated());

        let err = session.guard::<()>(Err(ClientError::Timeout)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Network);
    }
}
