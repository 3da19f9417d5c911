//! # Outlet State
//!
//! The stores the user may operate and the one this register works for.

use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use kasir_core::Store;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default)]
struct Outlets {
    known: Vec<Store>,
    active: Option<Store>,
}

#[derive(Debug, Default)]
pub struct OutletState {
    inner: Mutex<Outlets>,
}

impl OutletState {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Outlets) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }

    /// Puts back the store saved by a previous run.
    pub fn restore(&self, store: Store) {
        self.with(|o| {
            if !o.known.iter().any(|s| s.id == store.id) {
                o.known.push(store.clone());
            }
            o.active = Some(store);
        });
    }

    /// Replaces the known stores.
    ///
    /// The active store survives if it is still listed (refreshed to the
    /// new record) and is dropped otherwise.
    pub fn set_stores(&self, stores: Vec<Store>) {
        self.with(|o| {
            o.active = o
                .active
                .as_ref()
                .and_then(|active| stores.iter().find(|s| s.id == active.id).cloned());
            o.known = stores;
        });
    }

    pub fn stores(&self) -> Vec<Store> {
        self.with(|o| o.known.clone())
    }

    /// Makes a known store the active one.
    pub fn select_store(&self, store_id: Uuid) -> ApiResult<Store> {
        self.with(|o| {
            let store = o
                .known
                .iter()
                .find(|s| s.id == store_id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Store", &store_id.to_string()))?;
            o.active = Some(store.clone());
            Ok(store)
        })
    }

    pub fn active(&self) -> Option<Store> {
        self.with(|o| o.active.clone())
    }

    /// The active store, or `NO_STORE`.
    pub fn require_store(&self) -> ApiResult<Store> {
        self.active().ok_or_else(ApiError::no_store)
    }

    pub fn clear(&self) {
        self.with(|o| *o = Outlets::default());
    }
}
