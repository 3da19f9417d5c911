//! # Auth Commands
//!
//! Sign-in, sign-out and outlet selection.

use tracing::{debug, info};
use uuid::Uuid;

use kasir_client::PosBackend;
use kasir_core::{Store, User};

use crate::error::{ApiError, ApiResult};
use crate::session::PosSession;

/// Signs in and loads the user's stores.
///
/// A single available store is selected right away; with several the
/// cashier picks one with [`select_store`].
pub async fn login<B: PosBackend>(
    session: &PosSession<B>,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    let email = email.trim();
    debug!(email, "login command");

    if email.is_empty() {
        return Err(ApiError::validation("email is required"));
    }
    if password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let auth = session.guard(session.backend().login(email, password).await)?;
    let user = auth.user.clone();
    let token = auth.token.clone();
    session.auth.set(auth);

    let stores = session.guard(session.backend().list_stores(&token).await)?;
    if let [only] = stores.as_slice() {
        session.outlet.set_stores(stores.clone());
        session.outlet.select_store(only.id)?;
    } else {
        session.outlet.set_stores(stores);
    }
    session.persist();

    info!(user = %user.email, store = ?session.outlet.active().map(|s| s.name), "Logged in");
    Ok(user)
}

/// Signs out, forgetting the outlet and any open cart.
pub fn logout<B: PosBackend>(session: &PosSession<B>) {
    debug!("logout command");
    session.sign_out();
    info!("Logged out");
}

/// Asks the backend who the token belongs to.
pub async fn current_user<B: PosBackend>(session: &PosSession<B>) -> ApiResult<User> {
    debug!("current_user command");
    let token = session.token()?;
    session.guard(session.backend().current_user(&token).await)
}

/// Refreshes the list of stores the user may operate.
pub async fn list_stores<B: PosBackend>(session: &PosSession<B>) -> ApiResult<Vec<Store>> {
    debug!("list_stores command");
    let token = session.token()?;
    let stores = session.guard(session.backend().list_stores(&token).await)?;
    session.outlet.set_stores(stores.clone());
    session.persist();
    Ok(stores)
}

/// Switches the register to a known store.
///
/// Products are per store, so an open cart is discarded on a switch.
pub fn select_store<B: PosBackend>(session: &PosSession<B>, store_id: Uuid) -> ApiResult<Store> {
    debug!(%store_id, "select_store command");
    session.token()?;
    session.cart.ensure_idle()?;

    let previous = session.outlet.active().map(|s| s.id);
    let store = session.outlet.select_store(store_id)?;
    if previous != Some(store.id) {
        session.cart.with_cart_mut(|c| c.clear());
    }
    session.persist();

    info!(store = %store.name, "Store selected");
    Ok(store)
}
