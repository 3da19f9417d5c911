//! # Checkout
//!
//! Turns an AWAITING_PAYMENT cart into the request the backend persists.
//!
//! ## Settlement Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Settlement Path                                    │
//! │                                                                         │
//! │  cart.begin_checkout()                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_settlement(&cart)  ──► EmptyCart / NegativeTotal /            │
//! │       │                          InsufficientPayment (no I/O yet)       │
//! │       ▼                                                                 │
//! │  TransactionRequest::from_cart(&cart)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST /stores/{store}/transactions  ──► error: cart left as-is          │
//! │       │                                                                 │
//! │       ▼ ok                                                              │
//! │  cart.settle()  (clears)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartLine, CartPhase};
use crate::error::{CartError, CheckoutError, CheckoutResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentType, Percentage};
use crate::validation::validate_phone;

/// Fixed banknote suggestions shown after the exact total, in rupiah.
pub const QUICK_CASH_NOTES: [i64; 3] = [50_000, 100_000, 200_000];

// =============================================================================
// Transaction Request
// =============================================================================

/// One line of the transaction body.
///
/// Only the product id travels: the server re-reads name and price from its
/// own table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItemRequest {
    #[ts(as = "String")]
    pub product_id: Uuid,
    pub quantity: i64,
    pub discount_amount: Money,
}

impl From<&CartLine> for TransactionItemRequest {
    fn from(line: &CartLine) -> Self {
        TransactionItemRequest {
            product_id: line.product_id(),
            quantity: line.quantity(),
            discount_amount: line.effective_discount(),
        }
    }
}

/// The body submitted to create a transaction.
///
/// The cart-level discount is split into two fields: a fixed discount fills
/// `discount_amount` and leaves `discount_percent` at zero, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRequest {
    #[ts(as = "Option<String>")]
    pub customer_id: Option<Uuid>,
    pub items: Vec<TransactionItemRequest>,
    pub discount_amount: Money,
    pub discount_percent: Percentage,
    pub payment_amount: Money,
    pub payment_type: PaymentType,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

impl TransactionRequest {
    /// Builds the body from the current cart state.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::cart::Cart;
    /// use kasir_core::checkout::TransactionRequest;
    ///
    /// let cart = Cart::new();
    /// assert!(TransactionRequest::from_cart(&cart).is_err());
    /// ```
    pub fn from_cart(cart: &Cart) -> CheckoutResult<Self> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let discount = cart.discount();
        let notes = cart.notes().trim();

        Ok(TransactionRequest {
            customer_id: cart.customer().map(|c| c.id),
            items: cart.lines().iter().map(TransactionItemRequest::from).collect(),
            discount_amount: discount.fixed_amount(),
            discount_percent: discount.percent_rate(),
            payment_amount: cart.payment_amount(),
            payment_type: cart.payment_type(),
            payment_reference: cart.payment_reference().map(str::to_string),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

// =============================================================================
// Settlement Validation
// =============================================================================

/// Checks that the cart can be submitted.
///
/// ## Checks (in order)
/// 1. Cart has at least one line
/// 2. Cart is AWAITING_PAYMENT
/// 3. Total is not negative
/// 4. Payment amount covers the total
pub fn validate_settlement(cart: &Cart) -> CheckoutResult<()> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let phase = cart.phase();
    if phase != CartPhase::AwaitingPayment {
        return Err(CartError::WrongPhase {
            expected: CartPhase::AwaitingPayment,
            actual: phase,
        }
        .into());
    }

    let total = cart.total();
    if total.is_negative() {
        return Err(CheckoutError::NegativeTotal { total });
    }

    let tendered = cart.payment_amount();
    if tendered < total {
        return Err(CheckoutError::InsufficientPayment {
            due: total,
            tendered,
        });
    }

    Ok(())
}

// =============================================================================
// Tender Suggestions
// =============================================================================

/// Suggested tender amounts for the payment dialog.
///
/// The exact total (floored at zero) first, then Rp 50.000, Rp 100.000 and
/// Rp 200.000. A note equal to the total is not repeated; notes below the
/// total are still offered, in their fixed order.
///
/// ## Example
/// ```rust
/// use kasir_core::checkout::quick_cash_amounts;
/// use kasir_core::money::Money;
///
/// let amounts: Vec<i64> = quick_cash_amounts(Money::from_minor(18_000))
///     .into_iter()
///     .map(|m| m.minor())
///     .collect();
/// assert_eq!(amounts, vec![18_000, 50_000, 100_000, 200_000]);
/// ```
pub fn quick_cash_amounts(total: Money) -> Vec<Money> {
    let exact = total.non_negative();

    std::iter::once(exact)
        .chain(
            QUICK_CASH_NOTES
                .iter()
                .map(|&note| Money::from_minor(note))
                .filter(|&note| note != exact),
        )
        .collect()
}

// =============================================================================
// Receipt Request
// =============================================================================

/// Body for delivering a receipt over WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptRequest {
    #[ts(as = "String")]
    pub transaction_id: Uuid,
    pub phone: String,
}

impl ReceiptRequest {
    /// Validates and normalizes the phone number.
    pub fn new(transaction_id: Uuid, phone: &str) -> Result<Self, ValidationError> {
        Ok(ReceiptRequest {
            transaction_id,
            phone: validate_phone(phone)?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
