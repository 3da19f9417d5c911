//! # Domain Types
//!
//! Typed records for everything the cart engine touches.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name, unit     │   │  name, phone    │   │  invoice_number │       │
//! │  │  price (Money)  │   │  total_spent    │   │  total, change  │       │
//! │  │  stock/min_stock│   │                 │   │  items          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Percentage    │   │    Discount     │   │  PaymentType    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Fixed{amount}  │   │  Cash, Qris     │       │
//! │  │  1000 = 10%     │   │  Percent{rate}  │   │  Transfer, ...  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product, Customer, Store and User are snapshots handed over by the REST
//! backend. The engine never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A rate held in basis points (1 bps = 0.01%).
///
/// ## Why Basis Points?
/// Cashiers type whole or half percents ("10", "12.5"). Basis points keep
/// those exact as integers, so `Money::percent_of` never touches a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Basis points in 100%.
    pub const BPS_SCALE: u32 = 10_000;

    /// 100%.
    pub const HUNDRED: Percentage = Percentage(Self::BPS_SCALE);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a rate from a whole percent (10 → 10%).
    ///
    /// Saturates at `u32::MAX` basis points.
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Percentage(percent.saturating_mul(100))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the rate as a percentage (for display and the wire only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product snapshot as returned by the backend.
///
/// ## Snapshot Semantics
/// The cart keeps the snapshot taken when the product was added. A price
/// change on the backend does not reach an open cart; the server re-prices
/// from its own table when the transaction is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    #[ts(as = "String")]
    pub id: Uuid,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, or a generated code).
    pub barcode: Option<String>,

    pub sku: Option<String>,

    #[ts(as = "Option<String>")]
    pub category_id: Option<Uuid>,

    pub category_name: Option<String>,

    /// Unit price, never negative.
    pub price: Money,

    /// Purchase cost (profit reports only).
    pub cost: Money,

    /// Current stock count as last seen by the backend.
    pub stock: i64,

    /// Threshold under which the product counts as low stock.
    pub min_stock: i64,

    /// Unit label ("pcs", "kg", "box").
    pub unit: String,

    pub is_active: bool,

    /// Whether stock counts are maintained for this product.
    pub track_stock: bool,
}

impl Product {
    /// True when stock is tracked and at or below the minimum threshold.
    pub fn is_low_stock(&self) -> bool {
        self.track_stock && self.stock <= self.min_stock
    }

    /// Checks if `quantity` units can be sold from the current stock.
    ///
    /// This is a UI hint only. The cart never blocks on stock; the backend
    /// rejects the transaction if stock ran out in the meantime.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.track_stock || self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record, optionally linked to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    #[ts(as = "String")]
    pub id: Uuid,
    pub name: String,
    /// WhatsApp-capable phone number, used to prefill receipt delivery.
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Loyalty context: completed purchases so far.
    pub total_transactions: i64,
    /// Loyalty context: lifetime spend.
    pub total_spent: Money,
}

// =============================================================================
// Discount
// =============================================================================

/// The cart-level discount.
///
/// ## Composition
/// ```text
/// Σ line (price × qty − line_discount)  =  subtotal
///                                             │
///           Fixed { amount }  ──► amount      │  (uncapped)
///           Percent { rate }  ──► subtotal × rate, rounded
///                                             ▼
///                         total = subtotal − discount_amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discount {
    /// Flat amount off the subtotal.
    Fixed { amount: Money },
    /// Share of the subtotal, 0–100%.
    Percent { rate: Percentage },
}

impl Discount {
    /// The "no discount" value a fresh cart starts with.
    pub const NONE: Discount = Discount::Fixed {
        amount: Money::zero(),
    };

    /// Builds a fixed discount, rejecting negative amounts.
    pub fn fixed(amount: Money) -> Result<Self, ValidationError> {
        if amount.is_negative() {
            return Err(ValidationError::MustBeNonNegative {
                field: "discount".to_string(),
            });
        }
        Ok(Discount::Fixed { amount })
    }

    /// Builds a percent discount, rejecting rates above 100%.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::types::{Discount, Percentage};
    ///
    /// assert!(Discount::percent(Percentage::from_percent(10)).is_ok());
    /// assert!(Discount::percent(Percentage::from_percent(101)).is_err());
    /// ```
    pub fn percent(rate: Percentage) -> Result<Self, ValidationError> {
        if rate > Percentage::HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "discount percent".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Discount::Percent { rate })
    }

    /// The amount this discount takes off `subtotal`.
    pub fn amount_on(&self, subtotal: Money) -> Money {
        match self {
            Discount::Fixed { amount } => *amount,
            Discount::Percent { rate } => subtotal.percent_of(*rate),
        }
    }

    /// Fixed amount for the transaction body (zero for percent discounts).
    pub fn fixed_amount(&self) -> Money {
        match self {
            Discount::Fixed { amount } => *amount,
            Discount::Percent { .. } => Money::zero(),
        }
    }

    /// Percent rate for the transaction body (zero for fixed discounts).
    pub fn percent_rate(&self) -> Percentage {
        match self {
            Discount::Fixed { .. } => Percentage::zero(),
            Discount::Percent { rate } => *rate,
        }
    }

    pub fn is_none(&self) -> bool {
        match self {
            Discount::Fixed { amount } => amount.is_zero(),
            Discount::Percent { rate } => rate.is_zero(),
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::NONE
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How the customer pays. The backend accepts exactly these five tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Cash,
    /// Indonesian standard QR payment.
    Qris,
    Transfer,
    Debit,
    Credit,
}

impl PaymentType {
    pub const ALL: [PaymentType; 5] = [
        PaymentType::Cash,
        PaymentType::Qris,
        PaymentType::Transfer,
        PaymentType::Debit,
        PaymentType::Credit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Qris => "qris",
            PaymentType::Transfer => "transfer",
            PaymentType::Debit => "debit",
            PaymentType::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PaymentType::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment type".to_string(),
                allowed: PaymentType::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Store & User
// =============================================================================

/// A retail outlet the signed-in user can operate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Store {
    #[ts(as = "String")]
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// ISO 4217 code, e.g. "IDR".
    pub currency: String,
    /// Applied by the backend on top of the client total.
    pub tax_rate: Percentage,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    #[ts(as = "String")]
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub phone: Option<String>,
}

// =============================================================================
// Transaction (persisted)
// =============================================================================

/// A transaction as persisted and echoed back by the backend.
///
/// Read-only on the client. Totals here are the server's, which include tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    #[ts(as = "String")]
    pub id: Uuid,
    pub invoice_number: String,
    #[ts(as = "Option<String>")]
    pub customer_id: Option<Uuid>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub discount_percent: Percentage,
    pub tax_amount: Money,
    pub total: Money,
    pub payment_amount: Money,
    pub change_amount: Money,
    pub payment_type: PaymentType,
    pub payment_reference: Option<String>,
    /// Backend status tag; "completed" for every sale created here.
    pub status: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransactionItem>,
}

/// A persisted line, frozen at the price the server charged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItem {
    #[ts(as = "Option<String>")]
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: i64,
    pub discount_amount: Money,
    pub subtotal: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
