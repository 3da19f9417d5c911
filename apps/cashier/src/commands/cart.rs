//! # Cart Commands
//!
//! Building the sale: scanning, editing lines, discounts and the customer.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────┐     ┌──────────┐   │
//! │  │  Empty   │────►│ Building │────►│   Awaiting   │────►│ Settled  │   │
//! │  │          │     │          │◄────│   Payment    │     │ (→Empty) │   │
//! │  └──────────┘     └──────────┘     └──────────────┘     └──────────┘   │
//! │                        │         resume_editing  │                      │
//! │                   scan_barcode              pay (sale.rs)               │
//! │                   update_quantity                                       │
//! │                   set_discount                                          │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use kasir_client::PosBackend;
use kasir_core::validation::{
    validate_barcode, validate_customer_name, validate_discount, validate_phone,
    validate_search_query,
};
use kasir_core::{
    Cart, CartError, CartLine, CartPhase, CartTotals, Customer, Discount, Money, PaymentType,
    Product,
};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::session::PosSession;

/// Cart response including lines and totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub customer: Option<Customer>,
    pub discount: Discount,
    pub payment_type: PaymentType,
    pub payment_reference: Option<String>,
    pub notes: String,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines().to_vec(),
            totals: CartTotals::from(cart),
            customer: cart.customer().cloned(),
            discount: cart.discount(),
            payment_type: cart.payment_type(),
            payment_reference: cart.payment_reference().map(str::to_string),
            notes: cart.notes().to_string(),
        }
    }
}

// `From<&Cart>` fixes the borrow's lifetime, so it can't stand in for the
// higher-ranked `FnOnce(&Cart)` that `with_cart` takes.
#[allow(clippy::redundant_closure)]
fn respond<B: PosBackend>(session: &PosSession<B>) -> CartResponse {
    session.cart.with_cart(|c| CartResponse::from(c))
}

/// Rejects early, before any backend call, when lines are frozen.
fn ensure_editable<B: PosBackend>(session: &PosSession<B>) -> ApiResult<()> {
    if session.cart.with_cart(|c| c.phase()) == CartPhase::AwaitingPayment {
        return Err(CartError::Frozen.into());
    }
    Ok(())
}

fn add_looked_up<B: PosBackend>(session: &PosSession<B>, product: Product) -> ApiResult<CartResponse> {
    if !product.is_active {
        return Err(ApiError::new(
            ErrorCode::ValidationError,
            format!("{} is not available for sale", product.name),
        ));
    }
    if !product.can_sell(1) {
        debug!(product = %product.name, stock = product.stock, "Adding product with no stock left");
    }

    let name = product.name.clone();
    session.cart.with_cart_mut(|c| c.add_item(product))?;
    debug!(product = %name, "Added to cart");
    Ok(respond(session))
}

/// Gets the current cart contents.
pub fn get_cart<B: PosBackend>(session: &PosSession<B>) -> CartResponse {
    debug!("get_cart command");
    respond(session)
}

/// Looks a barcode up and adds the product.
///
/// ## Behavior
/// - Same product again: its line quantity goes up by one
/// - Unknown barcode or inactive product: error, cart untouched
pub async fn scan_barcode<B: PosBackend>(
    session: &PosSession<B>,
    code: &str,
) -> ApiResult<CartResponse> {
    debug!(code, "scan_barcode command");
    let barcode = validate_barcode(code)?;
    ensure_editable(session)?;

    let (token, store) = session.context()?;
    let product = session.guard(
        session
            .backend()
            .product_by_barcode(&token, store.id, &barcode)
            .await,
    )?;

    add_looked_up(session, product)
}

/// Adds a product picked from search results.
pub async fn add_product<B: PosBackend>(
    session: &PosSession<B>,
    product_id: Uuid,
) -> ApiResult<CartResponse> {
    debug!(%product_id, "add_product command");
    ensure_editable(session)?;

    let (token, store) = session.context()?;
    let product = session.guard(
        session
            .backend()
            .product_by_id(&token, store.id, product_id)
            .await,
    )?;

    add_looked_up(session, product)
}

pub async fn search_products<B: PosBackend>(
    session: &PosSession<B>,
    query: &str,
) -> ApiResult<Vec<Product>> {
    debug!(query, "search_products command");
    let query = validate_search_query(query)?;
    let (token, store) = session.context()?;
    let per_page = session.config().api.per_page;

    let page = session.guard(
        session
            .backend()
            .search_products(&token, store.id, &query, per_page)
            .await,
    )?;
    Ok(page.data)
}

/// Sets a line's quantity; zero or less removes it.
pub fn update_quantity<B: PosBackend>(
    session: &PosSession<B>,
    product_id: Uuid,
    quantity: i64,
) -> ApiResult<CartResponse> {
    debug!(%product_id, quantity, "update_quantity command");
    session
        .cart
        .with_cart_mut(|c| c.update_item_quantity(product_id, quantity))?;
    Ok(respond(session))
}

/// Sets a line's discount; stored clamped to the line's gross.
pub fn update_line_discount<B: PosBackend>(
    session: &PosSession<B>,
    product_id: Uuid,
    amount: Money,
) -> ApiResult<CartResponse> {
    debug!(%product_id, %amount, "update_line_discount command");
    session
        .cart
        .with_cart_mut(|c| c.update_item_discount(product_id, amount))?;
    Ok(respond(session))
}

pub fn remove_item<B: PosBackend>(
    session: &PosSession<B>,
    product_id: Uuid,
) -> ApiResult<CartResponse> {
    debug!(%product_id, "remove_item command");
    session.cart.with_cart_mut(|c| c.remove_item(product_id))?;
    Ok(respond(session))
}

/// Replaces the cart-level discount.
pub fn set_discount<B: PosBackend>(
    session: &PosSession<B>,
    discount: Discount,
) -> ApiResult<CartResponse> {
    debug!(?discount, "set_discount command");
    validate_discount(&discount)?;
    session.cart.with_cart_mut(|c| c.set_discount(discount))?;
    Ok(respond(session))
}

/// Empties the cart in any phase.
pub fn clear_cart<B: PosBackend>(session: &PosSession<B>) -> ApiResult<CartResponse> {
    debug!("clear_cart command");
    session.cart.ensure_idle()?;
    session.cart.with_cart_mut(|c| c.clear());
    Ok(respond(session))
}

// =============================================================================
// Customer
// =============================================================================

pub async fn search_customers<B: PosBackend>(
    session: &PosSession<B>,
    query: &str,
) -> ApiResult<Vec<Customer>> {
    debug!(query, "search_customers command");
    let query = validate_search_query(query)?;
    let (token, store) = session.context()?;
    let per_page = session.config().api.per_page;

    let page = session.guard(
        session
            .backend()
            .search_customers(&token, store.id, &query, per_page)
            .await,
    )?;
    Ok(page.data)
}

/// Finds the customer by phone (creating them if new) and links them.
pub async fn link_customer_by_phone<B: PosBackend>(
    session: &PosSession<B>,
    phone: &str,
    name: Option<&str>,
) -> ApiResult<Customer> {
    debug!(phone, "link_customer_by_phone command");
    let phone = validate_phone(phone)?;
    let name = name
        .filter(|n| !n.trim().is_empty())
        .map(validate_customer_name)
        .transpose()?;

    let (token, store) = session.context()?;
    let customer = session.guard(
        session
            .backend()
            .find_or_create_customer(&token, store.id, &phone, name.as_deref())
            .await,
    )?;

    session
        .cart
        .with_cart_mut(|c| c.set_customer(Some(customer.clone())));
    info!(customer = %customer.name, "Customer linked");
    Ok(customer)
}

/// Links a customer picked from search results, or unlinks with `None`.
pub fn set_customer<B: PosBackend>(
    session: &PosSession<B>,
    customer: Option<Customer>,
) -> CartResponse {
    debug!(customer = ?customer.as_ref().map(|c| c.id), "set_customer command");
    session.cart.with_cart_mut(|c| c.set_customer(customer));
    respond(session)
}
