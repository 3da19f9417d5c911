//! # Cart State
//!
//! Shares the session's [`Cart`] between commands.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple commands may access/modify the cart
//! 2. Only one command should modify the cart at a time
//! 3. The console and tests drive commands from tokio tasks
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Cashier Action           Command                 Cart Change           │
//! │  ──────────────           ───────                 ───────────           │
//! │                                                                         │
//! │  Scan barcode ──────────► scan_barcode() ───────► add_item(product)    │
//! │                           (lookup first, lock after)                    │
//! │                                                                         │
//! │  Change quantity ───────► update_quantity() ────► lines[i].qty = n     │
//! │                                                                         │
//! │  Open payment ──────────► begin_checkout() ─────► AWAITING_PAYMENT     │
//! │                                                                         │
//! │  Pay ───────────────────► pay() ────────────────► settle() on success  │
//! │                                                                         │
//! │  NOTE: the lock is never held while a backend call is in flight.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Flag
//! While `pay()` waits for the backend, a [`SubmissionGuard`] is held. Commands
//! that could move the cart out of AWAITING_PAYMENT (resume, clear, store
//! switch, a second pay) check [`CartState::ensure_idle`] first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use kasir_core::Cart;

use crate::error::{ApiError, ApiResult, ErrorCode};

/// Thread-safe cart handle.
///
/// Clones share the same cart and submission flag.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    submitting: Arc<AtomicBool>,
}

/// Marks a payment as in flight; the flag is released on drop.
#[derive(Debug)]
pub struct SubmissionGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|c| CartTotals::from(c));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(product))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    /// A copy of the cart for building requests outside the lock.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    /// Raises the submission flag, or fails if a payment is already in flight.
    pub fn begin_submission(&self) -> ApiResult<SubmissionGuard> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| submitting_error())?;
        Ok(SubmissionGuard {
            flag: Arc::clone(&self.submitting),
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Fails with `CART_FROZEN` while a payment is being submitted.
    pub fn ensure_idle(&self) -> ApiResult<()> {
        if self.is_submitting() {
            return Err(submitting_error());
        }
        Ok(())
    }
}

fn submitting_error() -> ApiError {
    ApiError::new(
        ErrorCode::CartFrozen,
        "A payment is being submitted; wait for it to finish",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_core::{CartPhase, Money, Product};
    use uuid::Uuid;

    fn test_product(price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Aqua 600ml".to_string(),
            barcode: Some("8886008101053".to_string()),
            sku: None,
            category_id: None,
            category_name: None,
            price: Money::from_minor(price),
            cost: Money::zero(),
            stock: 24,
            min_stock: 6,
            unit: "btl".to_string(),
            is_active: true,
            track_stock: true,
        }
    }

    #[test]
    fn test_clones_share_one_cart() {
        let state = CartState::new();
        let other = state.clone();

        other
            .with_cart_mut(|c| c.add_item(test_product(4_000)))
            .unwrap();

        assert_eq!(state.with_cart(|c| c.item_count()), 1);
        assert_eq!(state.with_cart(|c| c.subtotal()).minor(), 4_000);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let state = CartState::new();
        state
            .with_cart_mut(|c| c.add_item(test_product(4_000)))
            .unwrap();

        let snapshot = state.snapshot();
        state.with_cart_mut(|c| c.clear());

        assert_eq!(snapshot.item_count(), 1);
        assert_eq!(state.with_cart(|c| c.phase()), CartPhase::Empty);
    }

    #[test]
    fn test_submission_flag_is_exclusive_and_released_on_drop() {
        let state = CartState::new();
        let other = state.clone();
        assert!(state.ensure_idle().is_ok());

        let guard = state.begin_submission().unwrap();
        assert!(other.is_submitting());
        assert_eq!(other.begin_submission().unwrap_err().code, ErrorCode::CartFrozen);
        assert_eq!(other.ensure_idle().unwrap_err().code, ErrorCode::CartFrozen);

        drop(guard);
        assert!(!state.is_submitting());
        assert!(other.begin_submission().is_ok());
    }

    #[test]
    fn test_poisoned_lock_still_usable() {
        let state = CartState::new();
        let poisoner = state.clone();
        let _ = std::thread::spawn(move || {
            poisoner.with_cart_mut(|_| panic!("boom"));
        })
        .join();

        assert!(state.with_cart(|c| c.is_empty()));
    }
}
