//! # Wire Format
//!
//! JSON shapes exchanged with the REST backend and their conversion into
//! `kasir_core` types.
//!
//! ## The Float Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend JSON                    │  kasir-core                          │
//! │  ─────────────                   │  ──────────                          │
//! │  "price": 18000.0        ──────► │  Money(18000)      (IDR, 0 dp)       │
//! │  "price": 12.5           ──────► │  Money(1250)       (USD, 2 dp)       │
//! │  "tax_rate": 11.0        ──────► │  Percentage(1100)  bps               │
//! │  "discount_percent": 10  ◄────── │  Percentage(1000)                    │
//! │                                                                         │
//! │  Floats exist only in this module. Everything past `into_domain` is     │
//! │  integer minor units.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Envelope
//! Every response is wrapped as `{ success, data?, error?, message? }`.
//! Lists come as `data: { data: [...], page, per_page, total, total_pages }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kasir_core::{
    Customer, Money, PaymentType, Percentage, Product, Store, Transaction, TransactionItem,
    TransactionRequest, User,
};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Envelope
// =============================================================================

/// The response wrapper used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps `data`, turning `success: false` into [`ClientError::Rejected`].
    pub fn into_data(self) -> ClientResult<T> {
        if !self.success {
            return Err(ClientError::Rejected(self.reason()));
        }
        self.data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }

    /// For endpoints whose data is irrelevant.
    pub fn into_unit(self) -> ClientResult<()> {
        if !self.success {
            return Err(ClientError::Rejected(self.reason()));
        }
        Ok(())
    }

    fn reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Converts every item, failing on the first bad one.
    pub fn try_map<U, F>(self, f: F) -> ClientResult<Page<U>>
    where
        F: FnMut(T) -> ClientResult<U>,
    {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<ClientResult<Vec<U>>>()?,
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        })
    }

    /// A single page holding all of `data`.
    pub fn single(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Page {
            per_page: data.len() as u32,
            data,
            page: 1,
            total,
            total_pages: 1,
        }
    }
}

// =============================================================================
// Money Scale
// =============================================================================

/// Converts between backend floats and integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyScale {
    decimals: u32,
}

impl MoneyScale {
    pub const fn new(decimals: u32) -> Self {
        MoneyScale { decimals }
    }

    fn factor(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// Major-unit float to minor units, rounded to the nearest unit.
    pub fn to_minor(&self, field: &str, value: f64) -> ClientResult<Money> {
        if !value.is_finite() {
            return Err(ClientError::Decode(format!("{} is not a finite number", field)));
        }
        let scaled = (value * self.factor()).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(ClientError::Decode(format!("{} is out of range", field)));
        }
        Ok(Money::from_minor(scaled as i64))
    }

    /// Like [`MoneyScale::to_minor`] but rejects negative amounts.
    pub fn to_minor_non_negative(&self, field: &str, value: f64) -> ClientResult<Money> {
        let money = self.to_minor(field, value)?;
        if money.is_negative() {
            return Err(ClientError::Decode(format!("{} must not be negative", field)));
        }
        Ok(money)
    }

    /// Minor units to a major-unit float for request bodies.
    pub fn to_major(&self, money: Money) -> f64 {
        money.minor() as f64 / self.factor()
    }
}

fn percent_to_bps(field: &str, value: f64) -> ClientResult<Percentage> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ClientError::Decode(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(Percentage::from_bps((value * 100.0).round() as u32))
}

fn parse_payment_type(value: &str) -> ClientResult<PaymentType> {
    value
        .parse()
        .map_err(|_| ClientError::Decode(format!("unknown payment type '{}'", value)))
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponseDto {
    pub access_token: String,
    /// Token lifetime (seconds).
    pub expires_in: i64,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    pub phone: Option<String>,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: dto.id,
            email: dto.email,
            full_name: dto.full_name,
            role: dto.role,
            phone: dto.phone,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDto {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub tax_rate: f64,
}

impl StoreDto {
    pub fn into_domain(self) -> ClientResult<Store> {
        Ok(Store {
            tax_rate: percent_to_bps("tax_rate", self.tax_rate)?,
            id: self.id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            currency: self.currency,
        })
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub track_stock: bool,
}

fn default_true() -> bool {
    true
}

impl ProductDto {
    pub fn into_domain(self, scale: MoneyScale) -> ClientResult<Product> {
        Ok(Product {
            price: scale.to_minor_non_negative("price", self.price)?,
            cost: scale.to_minor_non_negative("cost", self.cost)?,
            id: self.id,
            name: self.name,
            barcode: self.barcode,
            sku: self.sku,
            category_id: self.category_id,
            category_name: self.category_name,
            stock: self.stock,
            min_stock: self.min_stock,
            unit: self.unit,
            is_active: self.is_active,
            track_stock: self.track_stock,
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDto {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub total_transactions: i64,
    #[serde(default)]
    pub total_spent: f64,
}

impl CustomerDto {
    pub fn into_domain(self, scale: MoneyScale) -> ClientResult<Customer> {
        Ok(Customer {
            total_spent: scale.to_minor("total_spent", self.total_spent)?,
            id: self.id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            total_transactions: self.total_transactions,
        })
    }
}

/// Body for `POST /stores/{store}/customers/find-or-create`.
#[derive(Debug, Clone, Serialize)]
pub struct FindOrCreateCustomerBody<'a> {
    pub phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

// =============================================================================
// Transaction
// =============================================================================

/// Line of the create-transaction body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionItemBody {
    pub product_id: Uuid,
    pub quantity: i64,
    pub discount_amount: f64,
}

/// Body for `POST /stores/{store}/transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    pub items: Vec<TransactionItemBody>,
    pub discount_amount: f64,
    pub discount_percent: f64,
    pub payment_amount: f64,
    pub payment_type: PaymentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionBody {
    pub fn from_request(request: &TransactionRequest, scale: MoneyScale) -> Self {
        TransactionBody {
            customer_id: request.customer_id,
            items: request
                .items
                .iter()
                .map(|item| TransactionItemBody {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    discount_amount: scale.to_major(item.discount_amount),
                })
                .collect(),
            discount_amount: scale.to_major(request.discount_amount),
            discount_percent: request.discount_percent.percent(),
            payment_amount: scale.to_major(request.payment_amount),
            payment_type: request.payment_type,
            payment_reference: request.payment_reference.clone(),
            notes: request.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItemDto {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub discount_amount: f64,
    pub subtotal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDto {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub subtotal: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub total: f64,
    pub payment_amount: f64,
    #[serde(default)]
    pub change_amount: f64,
    pub payment_type: String,
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<TransactionItemDto>,
}

impl TransactionDto {
    pub fn into_domain(self, scale: MoneyScale) -> ClientResult<Transaction> {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                Ok(TransactionItem {
                    product_id: item.product_id,
                    product_price: scale.to_minor("product_price", item.product_price)?,
                    discount_amount: scale.to_minor("discount_amount", item.discount_amount)?,
                    subtotal: scale.to_minor("subtotal", item.subtotal)?,
                    product_name: item.product_name,
                    quantity: item.quantity,
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(Transaction {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            subtotal: scale.to_minor("subtotal", self.subtotal)?,
            discount_amount: scale.to_minor("discount_amount", self.discount_amount)?,
            discount_percent: percent_to_bps("discount_percent", self.discount_percent)?,
            tax_amount: scale.to_minor("tax_amount", self.tax_amount)?,
            total: scale.to_minor("total", self.total)?,
            payment_amount: scale.to_minor("payment_amount", self.payment_amount)?,
            change_amount: scale.to_minor("change_amount", self.change_amount)?,
            payment_type: parse_payment_type(&self.payment_type)?,
            payment_reference: self.payment_reference,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
            items,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
