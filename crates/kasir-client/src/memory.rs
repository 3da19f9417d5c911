//! In-memory `PosBackend` for tests and offline demos.
//!
//! Mirrors what the REST backend does on checkout: re-prices every line
//! from its own product table, applies the cart discount, adds the store's
//! tax, rejects short payment or stock, then decrements stock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use kasir_core::{
    Customer, Money, Percentage, Product, ReceiptRequest, Store, Transaction, TransactionItem,
    TransactionRequest, User,
};

use crate::backend::PosBackend;
use crate::error::{ClientError, ClientResult};
use crate::session_store::AuthSession;
use crate::wire::Page;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: User,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, Uuid>,
    stores: Vec<Store>,
    products: HashMap<Uuid, Vec<Product>>,
    customers: HashMap<Uuid, Vec<Customer>>,
    transactions: HashMap<Uuid, Vec<Transaction>>,
    receipts: Vec<ReceiptRequest>,
    next_token: u32,
    next_invoice: u32,
    fail_next: Option<ClientError>,
}

impl MemoryState {
    fn take_failure(&mut self) -> ClientResult<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn authorize(&self, token: &str) -> ClientResult<Uuid> {
        self.tokens
            .get(token)
            .copied()
            .ok_or(ClientError::Unauthorized)
    }

    fn store(&self, store_id: Uuid) -> ClientResult<&Store> {
        self.stores
            .iter()
            .find(|s| s.id == store_id)
            .ok_or_else(|| ClientError::NotFound(format!("Store not found: {}", store_id)))
    }

    /// Shared preamble of every authenticated, store-scoped call.
    fn enter(&mut self, token: &str, store_id: Uuid) -> ClientResult<()> {
        self.take_failure()?;
        self.authorize(token)?;
        self.store(store_id)?;
        Ok(())
    }
}

/// In-memory backend with seeding helpers and failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Registers a login and returns its user.
    pub fn add_account(&self, email: &str, password: &str, full_name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role: "owner".to_string(),
            phone: None,
        };
        self.state().accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    pub fn add_store(&self, name: &str, tax_rate: Percentage) -> Store {
        let store = Store {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: None,
            phone: None,
            currency: "IDR".to_string(),
            tax_rate,
        };
        self.state().stores.push(store.clone());
        store
    }

    pub fn add_product(&self, store_id: Uuid, product: Product) {
        self.state()
            .products
            .entry(store_id)
            .or_default()
            .push(product);
    }

    pub fn add_customer(&self, store_id: Uuid, customer: Customer) {
        self.state()
            .customers
            .entry(store_id)
            .or_default()
            .push(customer);
    }

    // =========================================================================
    // Test Controls
    // =========================================================================

    /// Makes the next call (of any kind) fail with `err`.
    pub fn fail_next(&self, err: ClientError) {
        self.state().fail_next = Some(err);
    }

    /// Invalidates every issued token, as an expiry on the server would.
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn transactions(&self, store_id: Uuid) -> Vec<Transaction> {
        self.state()
            .transactions
            .get(&store_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn receipts(&self) -> Vec<ReceiptRequest> {
        self.state().receipts.clone()
    }

    pub fn product(&self, store_id: Uuid, product_id: Uuid) -> Option<Product> {
        self.state()
            .products
            .get(&store_id)
            .and_then(|products| products.iter().find(|p| p.id == product_id).cloned())
    }

    pub fn customer_by_phone(&self, store_id: Uuid, phone: &str) -> Option<Customer> {
        self.state()
            .customers
            .get(&store_id)
            .and_then(|cs| cs.iter().find(|c| c.phone.as_deref() == Some(phone)).cloned())
    }
}

fn matches_query(query: &str, fields: &[Option<&str>]) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

fn paginate<T: Clone>(items: Vec<T>, per_page: u32) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let total_pages = total.div_ceil(per_page as u64).max(1) as u32;
    Page {
        data: items.into_iter().take(per_page as usize).collect(),
        page: 1,
        per_page,
        total,
        total_pages,
    }
}

#[async_trait]
impl PosBackend for InMemoryBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let mut state = self.state();
        state.take_failure()?;

        let account = state
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|a| a.password == password)
            .cloned()
            .ok_or(ClientError::Unauthorized)?;

        state.next_token += 1;
        let token = format!("mem-token-{:04}", state.next_token);
        state.tokens.insert(token.clone(), account.user.id);

        Ok(AuthSession {
            token,
            user: account.user,
            expires_at: Utc::now() + Duration::hours(24),
        })
    }

    async fn current_user(&self, token: &str) -> ClientResult<User> {
        let mut state = self.state();
        state.take_failure()?;
        let user_id = state.authorize(token)?;
        state
            .accounts
            .values()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or(ClientError::Unauthorized)
    }

    async fn list_stores(&self, token: &str) -> ClientResult<Vec<Store>> {
        let mut state = self.state();
        state.take_failure()?;
        state.authorize(token)?;
        Ok(state.stores.clone())
    }

    async fn search_products(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Product>> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        let found: Vec<Product> = state
            .products
            .get(&store_id)
            .map(|products| {
                products
                    .iter()
                    .filter(|p| p.is_active)
                    .filter(|p| {
                        matches_query(
                            query,
                            &[Some(p.name.as_str()), p.barcode.as_deref(), p.sku.as_deref()],
                        )
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(paginate(found, per_page))
    }

    async fn product_by_id(
        &self,
        token: &str,
        store_id: Uuid,
        product_id: Uuid,
    ) -> ClientResult<Product> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        state
            .products
            .get(&store_id)
            .and_then(|products| products.iter().find(|p| p.id == product_id))
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Product not found".to_string()))
    }

    async fn product_by_barcode(
        &self,
        token: &str,
        store_id: Uuid,
        barcode: &str,
    ) -> ClientResult<Product> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        state
            .products
            .get(&store_id)
            .and_then(|products| {
                products
                    .iter()
                    .find(|p| p.barcode.as_deref() == Some(barcode))
            })
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Product not found".to_string()))
    }

    async fn search_customers(
        &self,
        token: &str,
        store_id: Uuid,
        query: &str,
        per_page: u32,
    ) -> ClientResult<Page<Customer>> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        let found: Vec<Customer> = state
            .customers
            .get(&store_id)
            .map(|customers| {
                customers
                    .iter()
                    .filter(|c| matches_query(query, &[Some(c.name.as_str()), c.phone.as_deref()]))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(paginate(found, per_page))
    }

    async fn find_or_create_customer(
        &self,
        token: &str,
        store_id: Uuid,
        phone: &str,
        name: Option<&str>,
    ) -> ClientResult<Customer> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        let customers = state.customers.entry(store_id).or_default();
        if let Some(existing) = customers.iter().find(|c| c.phone.as_deref() == Some(phone)) {
            return Ok(existing.clone());
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(phone)
                .to_string(),
            phone: Some(phone.to_string()),
            email: None,
            address: None,
            total_transactions: 0,
            total_spent: Money::zero(),
        };
        customers.push(customer.clone());
        Ok(customer)
    }

    async fn create_transaction(
        &self,
        token: &str,
        store_id: Uuid,
        request: &TransactionRequest,
    ) -> ClientResult<Transaction> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        if request.items.is_empty() {
            return Err(ClientError::Validation("items are required".to_string()));
        }

        let tax_rate = state.store(store_id)?.tax_rate;
        let catalog = state.products.get(&store_id).cloned().unwrap_or_default();

        // Re-price every line from the catalog
        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = catalog
                .iter()
                .find(|p| p.id == item.product_id && p.is_active)
                .ok_or_else(|| {
                    ClientError::Validation(format!("Product not found: {}", item.product_id))
                })?;

            if product.track_stock && product.stock < item.quantity {
                return Err(ClientError::Validation(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }

            let gross = product.price * item.quantity;
            items.push(TransactionItem {
                product_id: Some(product.id),
                product_name: product.name.clone(),
                product_price: product.price,
                quantity: item.quantity,
                discount_amount: item.discount_amount,
                subtotal: gross - item.discount_amount,
            });
        }

        let subtotal: Money = items.iter().map(|i| i.subtotal).sum();
        let discount_amount = if request.discount_percent.is_zero() {
            request.discount_amount
        } else {
            subtotal.percent_of(request.discount_percent)
        };
        let taxable = subtotal - discount_amount;
        let tax_amount = taxable.percent_of(tax_rate);
        let total = taxable + tax_amount;

        if request.payment_amount < total {
            return Err(ClientError::Validation(
                "Insufficient payment amount".to_string(),
            ));
        }

        // Commit: stock, customer loyalty, transaction log
        if let Some(products) = state.products.get_mut(&store_id) {
            for item in &request.items {
                if let Some(p) = products.iter_mut().find(|p| p.id == item.product_id) {
                    if p.track_stock {
                        p.stock -= item.quantity;
                    }
                }
            }
        }

        if let Some(customer_id) = request.customer_id {
            if let Some(c) = state
                .customers
                .get_mut(&store_id)
                .and_then(|cs| cs.iter_mut().find(|c| c.id == customer_id))
            {
                c.total_transactions += 1;
                c.total_spent += total;
            }
        }

        state.next_invoice += 1;
        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-{}-{:04}", now.format("%Y%m%d"), state.next_invoice),
            customer_id: request.customer_id,
            subtotal,
            discount_amount,
            discount_percent: request.discount_percent,
            tax_amount,
            total,
            payment_amount: request.payment_amount,
            change_amount: request.payment_amount - total,
            payment_type: request.payment_type,
            payment_reference: request.payment_reference.clone(),
            status: "completed".to_string(),
            notes: request.notes.clone(),
            created_at: now,
            items,
        };

        state
            .transactions
            .entry(store_id)
            .or_default()
            .push(transaction.clone());

        Ok(transaction)
    }

    async fn send_receipt(
        &self,
        token: &str,
        store_id: Uuid,
        request: &ReceiptRequest,
    ) -> ClientResult<()> {
        let mut state = self.state();
        state.enter(token, store_id)?;

        let known = state
            .transactions
            .get(&store_id)
            .is_some_and(|txs| txs.iter().any(|t| t.id == request.transaction_id));
        if !known {
            return Err(ClientError::NotFound("Transaction not found".to_string()));
        }

        state.receipts.push(request.clone());
        Ok(())
    }
}
