//! # Sale Commands
//!
//! Taking payment and sending the receipt.
//!
//! ## Settlement
//! ```text
//! begin_checkout ──► set_payment ──► pay
//!                                     │
//!                      validate_settlement(cart)   empty / short / negative?
//!                                     │                 └──► ApiError, cart unchanged
//!                      TransactionRequest::from_cart
//!                                     │
//!                      backend.create_transaction  rejected / offline?
//!                                     │                 └──► ApiError, cart unchanged
//!                      cart.settle()  (→ EMPTY)      phase changed meanwhile?
//!                                     │                 └──► warn, cart kept
//!                                     │
//!                      last_sale = { transaction, customer phone }
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kasir_client::PosBackend;
use kasir_core::checkout::{quick_cash_amounts, validate_settlement};
use kasir_core::validation::validate_payment_amount;
use kasir_core::{Money, PaymentType, ReceiptRequest, Transaction, TransactionRequest, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::session::{PosSession, SettledSale};

/// What the payment dialog shows when it opens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub total: Money,
    pub payment_amount: Money,
    pub change: Money,
    pub quick_cash: Vec<Money>,
}

/// The confirmed sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub transaction: Transaction,
    /// Customer to offer the receipt to, if one was linked.
    pub receipt_phone: Option<String>,
}

fn checkout_response<B: PosBackend>(session: &PosSession<B>) -> CheckoutResponse {
    session.cart.with_cart(|c| CheckoutResponse {
        total: c.total(),
        payment_amount: c.payment_amount(),
        change: c.change(),
        quick_cash: quick_cash_amounts(c.total()),
    })
}

/// Opens the payment dialog: freezes the cart and prefills the amount.
pub fn begin_checkout<B: PosBackend>(session: &PosSession<B>) -> ApiResult<CheckoutResponse> {
    debug!("begin_checkout command");
    let total = session.cart.with_cart_mut(|c| c.begin_checkout())?;
    debug!(%total, "Awaiting payment");
    Ok(checkout_response(session))
}

/// Closes the payment dialog so lines can be edited again.
pub fn resume_editing<B: PosBackend>(session: &PosSession<B>) -> ApiResult<()> {
    debug!("resume_editing command");
    session.cart.ensure_idle()?;
    session.cart.with_cart_mut(|c| c.resume_editing());
    Ok(())
}

/// Records how and how much the customer pays.
pub fn set_payment<B: PosBackend>(
    session: &PosSession<B>,
    payment_type: PaymentType,
    amount: Money,
) -> ApiResult<CheckoutResponse> {
    debug!(%payment_type, %amount, "set_payment command");
    validate_payment_amount(amount)?;
    session.cart.with_cart_mut(|c| {
        c.set_payment_type(payment_type);
        c.set_payment_amount(amount);
    });
    Ok(checkout_response(session))
}

pub fn set_payment_reference<B: PosBackend>(session: &PosSession<B>, reference: Option<String>) {
    debug!(?reference, "set_payment_reference command");
    session
        .cart
        .with_cart_mut(|c| c.set_payment_reference(reference));
}

pub fn set_notes<B: PosBackend>(session: &PosSession<B>, notes: &str) {
    debug!("set_notes command");
    session.cart.with_cart_mut(|c| c.set_notes(notes));
}

/// Tender suggestions for the current total.
pub fn quick_cash<B: PosBackend>(session: &PosSession<B>) -> Vec<Money> {
    session.cart.with_cart(|c| quick_cash_amounts(c.total()))
}

/// Submits the sale and settles the cart once the backend confirms it.
pub async fn pay<B: PosBackend>(session: &PosSession<B>) -> ApiResult<SaleResponse> {
    debug!("pay command");

    let _submission = session.cart.begin_submission()?;
    let cart = session.cart.snapshot();
    validate_settlement(&cart)?;
    let request = TransactionRequest::from_cart(&cart)?;
    let receipt_phone = cart.customer().and_then(|c| c.phone.clone());

    let (token, store) = session.context()?;
    let transaction = session
        .guard(
            session
                .backend()
                .create_transaction(&token, store.id, &request)
                .await,
        )
        .inspect_err(|e| warn!(error = %e.message, "Transaction rejected, cart kept"))?;

    if let Err(e) = session.cart.with_cart_mut(|c| c.settle()) {
        // The sale is recorded either way; the cart is left for the cashier.
        warn!(
            error = %e,
            invoice = %transaction.invoice_number,
            "Cart left payment phase during submission, kept as is"
        );
    }

    info!(
        invoice = %transaction.invoice_number,
        total = %transaction.total,
        change = %transaction.change_amount,
        payment_type = %transaction.payment_type,
        "Sale settled"
    );

    session.record_sale(SettledSale {
        transaction: transaction.clone(),
        customer_phone: receipt_phone.clone(),
    });

    Ok(SaleResponse {
        transaction,
        receipt_phone,
    })
}

/// Sends a receipt over WhatsApp.
///
/// Both arguments default to the last sale of this session: its transaction
/// and the phone of the customer linked when it was settled.
pub async fn send_receipt<B: PosBackend>(
    session: &PosSession<B>,
    transaction_id: Option<Uuid>,
    phone: Option<&str>,
) -> ApiResult<ReceiptRequest> {
    debug!(?transaction_id, "send_receipt command");
    let last = session.last_sale();

    let transaction_id = transaction_id
        .or_else(|| last.as_ref().map(|s| s.transaction.id))
        .ok_or_else(|| ApiError::validation("No transaction to send a receipt for"))?;

    let phone = match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(phone) => phone.to_string(),
        None => last
            .as_ref()
            .filter(|s| s.transaction.id == transaction_id)
            .and_then(|s| s.customer_phone.clone())
            .ok_or_else(|| ValidationError::Required {
                field: "phone".to_string(),
            })?,
    };

    let request = ReceiptRequest::new(transaction_id, &phone)?;
    let (token, store) = session.context()?;
    session.guard(
        session
            .backend()
            .send_receipt(&token, store.id, &request)
            .await,
    )?;

    info!(%transaction_id, "Receipt sent");
    Ok(request)
}
