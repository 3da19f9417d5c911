//! # Cart Engine
//!
//! Owns the sale being built at the register and derives every amount the
//! cashier sees.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐ add_item ┌──────────┐ begin_checkout ┌──────────────────┐ │
//! │  │  EMPTY   │─────────►│ BUILDING │───────────────►│ AWAITING_PAYMENT │ │
//! │  │          │◄─────────│          │◄───────────────│   (frozen)       │ │
//! │  └──────────┘ last line└──────────┘ resume_editing └────────┬─────────┘ │
//! │       ▲       removed                                       │           │
//! │       │                                      settle() after │           │
//! │       │                                 backend confirmed   ▼           │
//! │       └──────────────────────── clear() ◄──────────── SETTLED           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derivations
//! Subtotal, discount amount, total and change are recomputed from the lines
//! on every call. Nothing is cached, so they can never go stale.
//!
//! ## Usage
//! ```rust
//! use kasir_core::cart::Cart;
//! use kasir_core::money::Money;
//! use kasir_core::types::{Discount, Percentage, Product};
//! use uuid::Uuid;
//!
//! let product = Product {
//!     id: Uuid::new_v4(),
//!     name: "Kopi Susu".to_string(),
//!     barcode: None,
//!     sku: None,
//!     category_id: None,
//!     category_name: None,
//!     price: Money::from_minor(10_000),
//!     cost: Money::zero(),
//!     stock: 50,
//!     min_stock: 5,
//!     unit: "cup".to_string(),
//!     is_active: true,
//!     track_stock: true,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(product.clone()).unwrap();
//! cart.add_item(product).unwrap();
//! cart.set_discount(Discount::Percent { rate: Percentage::from_percent(10) }).unwrap();
//!
//! assert_eq!(cart.subtotal().minor(), 20_000);
//! assert_eq!(cart.total().minor(), 18_000);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::money::Money;
use crate::types::{Customer, Discount, PaymentType, Product};

/// Largest quantity a single line may hold.
///
/// Keeps `price × quantity` far away from the `i64` range for any realistic
/// price, and catches a barcode typed into the quantity field.
pub const MAX_LINE_QUANTITY: i64 = 99_999;

// =============================================================================
// Cart Phase
// =============================================================================

/// Where the current sale is in its lifecycle.
///
/// `SETTLED` is not represented: settling clears the cart in the same call,
/// so the observable phase goes straight back to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    Empty,
    Building,
    AwaitingPayment,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart with its quantity and line discount.
///
/// ## Invariants
/// - `1 <= quantity <= MAX_LINE_QUANTITY` (setting 0 or less removes the
///   line instead)
/// - `0 <= line_discount <= price × quantity` when read through
///   [`CartLine::effective_discount`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    product: Product,
    quantity: i64,
    line_discount: Money,
}

impl CartLine {
    fn new(product: Product) -> Self {
        CartLine {
            product,
            quantity: 1,
            line_discount: Money::zero(),
        }
    }

    /// The product snapshot taken when the line was created.
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> Uuid {
        self.product.id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Discount as last set by the cashier.
    pub fn line_discount(&self) -> Money {
        self.line_discount
    }

    /// Unit price × quantity.
    pub fn gross(&self) -> Money {
        self.product.price.multiply_quantity(self.quantity)
    }

    /// The discount actually applied, bounded by the line's gross amount.
    ///
    /// A discount entered for 3 units stays stored when the quantity drops
    /// to 1; this bound keeps the line total from going negative.
    pub fn effective_discount(&self) -> Money {
        self.line_discount.min(self.gross()).non_negative()
    }

    /// Gross minus the effective line discount.
    pub fn total(&self) -> Money {
        self.gross() - self.effective_discount()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale.
///
/// ## Ownership
/// Exactly one cart per checkout session. It is owned by the session object
/// and only changes through the methods below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: Option<Customer>,
    discount: Discount,
    payment_type: PaymentType,
    payment_amount: Money,
    payment_reference: Option<String>,
    notes: String,
    awaiting_payment: bool,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Line Operations
    // =========================================================================

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: its quantity goes up by 1
    /// - Otherwise: a new line `{product, 1, 0}` is appended
    ///
    /// Stock is not checked here. A line already at [`MAX_LINE_QUANTITY`]
    /// is refused with `CartError::QuantityLimit` and left unchanged.
    pub fn add_item(&mut self, product: Product) -> CartResult<()> {
        self.ensure_editable()?;

        match self.line_mut(product.id) {
            Some(line) if line.quantity >= MAX_LINE_QUANTITY => {
                return Err(CartError::QuantityLimit {
                    max: MAX_LINE_QUANTITY,
                })
            }
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::new(product)),
        }
        Ok(())
    }

    /// Sets the quantity of a line (absolute, not a delta).
    ///
    /// `quantity <= 0` removes the line. Unknown product ids are a no-op.
    /// Quantities above [`MAX_LINE_QUANTITY`] are refused.
    pub fn update_item_quantity(&mut self, product_id: Uuid, quantity: i64) -> CartResult<()> {
        self.ensure_editable()?;

        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityLimit {
                max: MAX_LINE_QUANTITY,
            });
        }
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Sets the discount of a line (absolute).
    ///
    /// Negative amounts are stored as zero and amounts above the line's gross
    /// are stored as the gross. Unknown product ids are a no-op.
    pub fn update_item_discount(&mut self, product_id: Uuid, amount: Money) -> CartResult<()> {
        self.ensure_editable()?;

        if let Some(line) = self.line_mut(product_id) {
            line.line_discount = amount.min(line.gross()).non_negative();
        }
        Ok(())
    }

    /// Deletes the line for `product_id`; no-op if absent.
    pub fn remove_item(&mut self, product_id: Uuid) -> CartResult<()> {
        self.ensure_editable()?;

        self.lines.retain(|line| line.product.id != product_id);
        Ok(())
    }

    // =========================================================================
    // Field Setters
    // =========================================================================

    /// Links or unlinks a customer. Allowed in every phase.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    /// Replaces the cart-level discount.
    pub fn set_discount(&mut self, discount: Discount) -> CartResult<()> {
        self.ensure_editable()?;

        self.discount = discount;
        Ok(())
    }

    pub fn set_payment_type(&mut self, payment_type: PaymentType) {
        self.payment_type = payment_type;
    }

    pub fn set_payment_amount(&mut self, amount: Money) {
        self.payment_amount = amount;
    }

    /// Reference for non-cash payments (transfer id, QRIS reference).
    pub fn set_payment_reference(&mut self, reference: Option<String>) {
        self.payment_reference = reference.filter(|r| !r.trim().is_empty());
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    // =========================================================================
    // Derivations
    // =========================================================================

    /// Σ (price × quantity − line discount), in insertion order.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// The cart-level discount applied to the current subtotal.
    ///
    /// Fixed discounts are returned as-is, even above the subtotal.
    pub fn discount_amount(&self) -> Money {
        self.discount.amount_on(self.subtotal())
    }

    /// Subtotal minus cart-level discount. Not clamped: can be negative.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    /// Payment amount minus total, floored at zero.
    pub fn change(&self) -> Money {
        (self.payment_amount - self.total()).non_negative()
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn phase(&self) -> CartPhase {
        if self.awaiting_payment {
            CartPhase::AwaitingPayment
        } else if self.lines.is_empty() {
            CartPhase::Empty
        } else {
            CartPhase::Building
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn payment_amount(&self) -> Money {
        self.payment_amount
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    // =========================================================================
    // Checkout Phase Transitions
    // =========================================================================

    /// Enters AWAITING_PAYMENT and freezes lines and discount.
    ///
    /// Prefills the payment amount with the total (floored at zero) and
    /// returns the amount due. Calling it again while already awaiting
    /// payment keeps the cashier's entered amount.
    pub fn begin_checkout(&mut self) -> CartResult<Money> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }
        if !self.awaiting_payment {
            self.awaiting_payment = true;
            self.payment_amount = self.total().non_negative();
        }
        Ok(self.total())
    }

    /// Leaves AWAITING_PAYMENT so the cart can be edited again.
    pub fn resume_editing(&mut self) {
        self.awaiting_payment = false;
    }

    /// Marks the sale as settled and resets the cart.
    ///
    /// Call this only after the backend confirmed the transaction.
    pub fn settle(&mut self) -> CartResult<()> {
        let phase = self.phase();
        if phase != CartPhase::AwaitingPayment {
            return Err(CartError::WrongPhase {
                expected: CartPhase::AwaitingPayment,
                actual: phase,
            });
        }
        self.clear();
        Ok(())
    }

    /// Resets lines, customer, discount, payment fields and notes in a
    /// single assignment.
    pub fn clear(&mut self) {
        *self = Cart::new();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_editable(&self) -> CartResult<()> {
        if self.awaiting_payment {
            return Err(CartError::Frozen);
        }
        Ok(())
    }

    fn line_mut(&mut self, product_id: Uuid) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == product_id)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart totals summary for the cashier display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub phase: CartPhase,
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub payment_amount: Money,
    pub change: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            phase: cart.phase(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            discount_amount: cart.discount_amount(),
            total: cart.total(),
            payment_amount: cart.payment_amount(),
            change: cart.change(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Percentage;

    fn test_product(name: &str, price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            barcode: None,
            sku: None,
            category_id: None,
            category_name: None,
            price: Money::from_minor(price),
            cost: Money::zero(),
            stock: 100,
            min_stock: 0,
            unit: "pcs".to_string(),
            is_active: true,
            track_stock: true,
        }
    }

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Budi".to_string(),
            phone: Some("081234567890".to_string()),
            email: None,
            address: None,
            total_transactions: 4,
            total_spent: Money::from_minor(250_000),
        }
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.phase(), CartPhase::Empty);
        assert_eq!(cart.discount(), Discount::NONE);
        assert_eq!(cart.payment_type(), PaymentType::Cash);
        assert!(cart.subtotal().is_zero());
        assert!(cart.change().is_zero());
    }

    #[test]
    fn test_add_same_product_twice_increments_quantity() {
        // Scenario A
        let mut cart = Cart::new();
        let product = test_product("Beras 1kg", 10_000);

        cart.add_item(product.clone()).unwrap();
        cart.add_item(product.clone()).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.line(product.id).unwrap().quantity(), 2);
        assert_eq!(cart.subtotal().minor(), 20_000);
        assert_eq!(cart.phase(), CartPhase::Building);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::new();
        let a = test_product("A", 100);
        let b = test_product("B", 200);
        cart.add_item(a.clone()).unwrap();
        cart.add_item(b.clone()).unwrap();
        cart.add_item(a.clone()).unwrap();

        let ids: Vec<Uuid> = cart.lines().iter().map(CartLine::product_id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_percent_discount_and_change() {
        // Scenarios B, C, D
        let mut cart = Cart::new();
        let product = test_product("Beras 1kg", 10_000);
        cart.add_item(product.clone()).unwrap();
        cart.add_item(product).unwrap();
        cart.set_discount(Discount::Percent { rate: Percentage::from_percent(10) }).unwrap();

        assert_eq!(cart.discount_amount().minor(), 2_000);
        assert_eq!(cart.total().minor(), 18_000);

        cart.set_payment_amount(Money::from_minor(20_000));
        assert_eq!(cart.change().minor(), 2_000);

        cart.set_payment_amount(Money::from_minor(15_000));
        assert!(cart.change().is_zero());
    }

    #[test]
    fn test_fixed_discount_can_make_total_negative() {
        let mut cart = Cart::new();
        cart.add_item(test_product("Permen", 1_000)).unwrap();
        cart.set_discount(Discount::Fixed { amount: Money::from_minor(5_000) }).unwrap();

        assert_eq!(cart.discount_amount().minor(), 5_000);
        assert_eq!(cart.total().minor(), -4_000);
        assert_eq!(cart.total(), cart.subtotal() - cart.discount_amount());

        cart.set_payment_amount(Money::zero());
        assert_eq!(cart.change().minor(), 4_000);
    }

    #[test]
    fn test_update_quantity_absolute_and_zero_removes() {
        let mut cart = Cart::new();
        let a = test_product("A", 1_500);
        let b = test_product("B", 2_000);
        cart.add_item(a.clone()).unwrap();
        cart.add_item(b.clone()).unwrap();

        cart.update_item_quantity(a.id, 5).unwrap();
        assert_eq!(cart.line(a.id).unwrap().quantity(), 5);
        assert_eq!(cart.subtotal().minor(), 5 * 1_500 + 2_000);

        cart.update_item_quantity(a.id, 0).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(cart.line(a.id).is_none());

        cart.update_item_quantity(b.id, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_above_limit_is_refused() {
        let mut cart = Cart::new();
        let product = test_product("Beras 1kg", 10_000);
        cart.add_item(product.clone()).unwrap();
        cart.update_item_quantity(product.id, 3).unwrap();

        let err = cart.update_item_quantity(product.id, i64::MAX).unwrap_err();
        assert_eq!(err, CartError::QuantityLimit { max: MAX_LINE_QUANTITY });
        assert_eq!(cart.line(product.id).unwrap().quantity(), 3);
        assert_eq!(cart.total().minor(), 30_000);

        cart.update_item_quantity(product.id, MAX_LINE_QUANTITY).unwrap();
        assert_eq!(cart.subtotal().minor(), 10_000 * MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_at_limit_leaves_line_unchanged() {
        let mut cart = Cart::new();
        let product = test_product("Permen", 500);
        cart.add_item(product.clone()).unwrap();
        cart.update_item_quantity(product.id, MAX_LINE_QUANTITY).unwrap();

        let err = cart.add_item(product.clone()).unwrap_err();
        assert!(matches!(err, CartError::QuantityLimit { .. }));
        assert_eq!(cart.line(product.id).unwrap().quantity(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_huge_price_saturates_instead_of_panicking() {
        let mut cart = Cart::new();
        let product = test_product("Salah harga", i64::MAX / 2);
        cart.add_item(product.clone()).unwrap();
        cart.update_item_quantity(product.id, MAX_LINE_QUANTITY).unwrap();

        assert_eq!(cart.subtotal().minor(), i64::MAX);
        cart.set_payment_amount(Money::from_minor(i64::MIN));
        assert!(cart.change().is_zero());
    }

    #[test]
    fn test_update_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(test_product("A", 1_000)).unwrap();
        let before = cart.clone();

        let missing = Uuid::new_v4();
        cart.update_item_quantity(missing, 4).unwrap();
        cart.update_item_discount(missing, Money::from_minor(100)).unwrap();
        cart.remove_item(missing).unwrap();

        assert_eq!(cart, before);
    }

    #[test]
    fn test_line_discount_is_bounded() {
        let mut cart = Cart::new();
        let product = test_product("Sabun", 4_000);
        cart.add_item(product.clone()).unwrap();
        cart.update_item_quantity(product.id, 3).unwrap();

        cart.update_item_discount(product.id, Money::from_minor(1_000)).unwrap();
        assert_eq!(cart.subtotal().minor(), 11_000);

        cart.update_item_discount(product.id, Money::from_minor(50_000)).unwrap();
        assert_eq!(cart.line(product.id).unwrap().line_discount().minor(), 12_000);
        assert!(cart.subtotal().is_zero());

        cart.update_item_discount(product.id, Money::from_minor(-500)).unwrap();
        assert!(cart.line(product.id).unwrap().line_discount().is_zero());
    }

    #[test]
    fn test_line_discount_follows_quantity_decrease() {
        let mut cart = Cart::new();
        let product = test_product("Sabun", 4_000);
        cart.add_item(product.clone()).unwrap();
        cart.update_item_quantity(product.id, 3).unwrap();
        cart.update_item_discount(product.id, Money::from_minor(10_000)).unwrap();

        cart.update_item_quantity(product.id, 1).unwrap();
        let line = cart.line(product.id).unwrap();
        assert_eq!(line.effective_discount().minor(), 4_000);
        assert!(line.total().is_zero());
    }

    #[test]
    fn test_remove_only_line_equals_cleared_cart() {
        // Scenario E
        let mut cart = Cart::new();
        let product = test_product("A", 1_000);
        cart.add_item(product.clone()).unwrap();
        cart.remove_item(product.id).unwrap();

        let mut cleared = Cart::new();
        cleared.clear();

        assert_eq!(cart, cleared);
        assert_eq!(cart.phase(), CartPhase::Empty);
    }

    #[test]
    fn test_clear_resets_everything_and_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(test_product("A", 1_000)).unwrap();
        cart.set_customer(Some(customer()));
        cart.set_discount(Discount::Fixed { amount: Money::from_minor(100) }).unwrap();
        cart.set_payment_type(PaymentType::Qris);
        cart.set_payment_amount(Money::from_minor(5_000));
        cart.set_payment_reference(Some("QR-881".to_string()));
        cart.set_notes("bungkus terpisah");
        cart.begin_checkout().unwrap();

        cart.clear();
        let once = cart.clone();
        cart.clear();

        assert_eq!(cart, once);
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn test_begin_checkout_requires_lines() {
        let mut cart = Cart::new();
        assert_eq!(cart.begin_checkout(), Err(CartError::Empty));
        assert_eq!(cart.phase(), CartPhase::Empty);
    }

    #[test]
    fn test_begin_checkout_prefills_payment_and_freezes() {
        let mut cart = Cart::new();
        let product = test_product("A", 7_500);
        cart.add_item(product.clone()).unwrap();

        let due = cart.begin_checkout().unwrap();
        assert_eq!(due.minor(), 7_500);
        assert_eq!(cart.payment_amount().minor(), 7_500);
        assert_eq!(cart.phase(), CartPhase::AwaitingPayment);

        assert_eq!(cart.add_item(product.clone()), Err(CartError::Frozen));
        assert_eq!(cart.update_item_quantity(product.id, 9), Err(CartError::Frozen));
        assert_eq!(
            cart.update_item_discount(product.id, Money::from_minor(1)),
            Err(CartError::Frozen)
        );
        assert_eq!(cart.remove_item(product.id), Err(CartError::Frozen));
        assert_eq!(cart.set_discount(Discount::NONE), Err(CartError::Frozen));
        assert_eq!(cart.total().minor(), 7_500);

        // Payment fields stay editable
        cart.set_payment_type(PaymentType::Transfer);
        cart.set_payment_amount(Money::from_minor(10_000));
        cart.set_customer(Some(customer()));
        assert_eq!(cart.change().minor(), 2_500);
    }

    #[test]
    fn test_begin_checkout_twice_keeps_entered_amount() {
        let mut cart = Cart::new();
        cart.add_item(test_product("A", 7_500)).unwrap();
        cart.begin_checkout().unwrap();
        cart.set_payment_amount(Money::from_minor(10_000));

        cart.begin_checkout().unwrap();
        assert_eq!(cart.payment_amount().minor(), 10_000);
    }

    #[test]
    fn test_negative_total_prefills_zero_payment() {
        let mut cart = Cart::new();
        cart.add_item(test_product("A", 1_000)).unwrap();
        cart.set_discount(Discount::Fixed { amount: Money::from_minor(3_000) }).unwrap();

        let due = cart.begin_checkout().unwrap();
        assert_eq!(due.minor(), -2_000);
        assert!(cart.payment_amount().is_zero());
    }

    #[test]
    fn test_resume_editing_unfreezes() {
        let mut cart = Cart::new();
        let product = test_product("A", 1_000);
        cart.add_item(product.clone()).unwrap();
        cart.begin_checkout().unwrap();

        cart.resume_editing();
        assert_eq!(cart.phase(), CartPhase::Building);
        cart.add_item(product).unwrap();
        assert_eq!(cart.total().minor(), 2_000);
    }

    #[test]
    fn test_settle_requires_awaiting_payment() {
        let mut cart = Cart::new();
        cart.add_item(test_product("A", 1_000)).unwrap();

        assert_eq!(
            cart.settle(),
            Err(CartError::WrongPhase {
                expected: CartPhase::AwaitingPayment,
                actual: CartPhase::Building,
            })
        );
        assert_eq!(cart.item_count(), 1);

        cart.begin_checkout().unwrap();
        cart.settle().unwrap();
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn test_payment_reference_blank_is_none() {
        let mut cart = Cart::new();
        cart.set_payment_reference(Some("   ".to_string()));
        assert!(cart.payment_reference().is_none());
        cart.set_payment_reference(Some("TRF-01".to_string()));
        assert_eq!(cart.payment_reference(), Some("TRF-01"));
    }

    #[test]
    fn test_totals_snapshot() {
        let mut cart = Cart::new();
        let product = test_product("A", 2_500);
        cart.add_item(product.clone()).unwrap();
        cart.add_item(product).unwrap();
        cart.set_payment_amount(Money::from_minor(10_000));

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 2);
        assert_eq!(totals.subtotal.minor(), 5_000);
        assert_eq!(totals.total.minor(), 5_000);
        assert_eq!(totals.change.minor(), 5_000);
        assert_eq!(totals.phase, CartPhase::Building);
    }
}
