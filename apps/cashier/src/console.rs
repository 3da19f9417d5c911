//! # Cashier Console
//!
//! A line-oriented front end for the commands. Each input line is parsed
//! into a [`Command`], dispatched, and answered with text.
//!
//! ## Commands
//! ```text
//! login <email> <password>       logout
//! stores                         use <n|store-id>
//! search <query>                 add <n|product-id>
//! scan <barcode>                 qty <line> <quantity>
//! disc <line> <amount>           rm <line>
//! discount <amount|n%|none>      note <text>
//! customer <phone> [name]        customer none
//! customers <query>              cart | json
//! checkout                       edit
//! pay [type] [amount] [ref]      receipt [phone]
//! clear                          help | quit
//! ```
//!
//! Lines are numbered from 1 in the order products were added.

use std::sync::{Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use uuid::Uuid;

use kasir_client::{format_money, CurrencyFormat, PosBackend};
use kasir_core::validation::parse_percentage;
use kasir_core::{Discount, Money, PaymentType, Product};

use crate::commands::cart::CartResponse;
use crate::commands::{auth, cart, sale};
use crate::error::{ApiError, ApiResult};
use crate::session::PosSession;

pub const HELP: &str = "\
login <email> <password>   sign in
logout                     sign out and forget the store
stores                     list stores
use <n|id>                 select a store
search <query>             search products
add <n|id>                 add a product from the last search
scan <barcode>             add a product by barcode
qty <line> <quantity>      set quantity (0 removes)
disc <line> <amount>       set a line discount
rm <line>                  remove a line
discount <amount|n%|none>  set the cart discount
customer <phone> [name]    find or create and link a customer
customer none              unlink the customer
customers <query>          search customers
note <text>                set the sale notes
cart | json                show the cart
checkout                   open payment
edit                       back to editing
pay [type] [amount] [ref]  take payment and submit
receipt [phone]            send the last receipt over WhatsApp
clear                      empty the cart
quit                       exit";

// =============================================================================
// Parsing
// =============================================================================

/// A store or product picked by list position or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Index(usize),
    Id(Uuid),
}

impl Pick {
    fn parse(arg: &str) -> ApiResult<Self> {
        if let Ok(n) = arg.parse::<usize>() {
            return position(n).map(Pick::Index);
        }
        Uuid::parse_str(arg)
            .map(Pick::Id)
            .map_err(|_| ApiError::validation(format!("'{}' is neither a number nor an id", arg)))
    }
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login { email: String, password: String },
    Logout,
    Stores,
    Use(Pick),
    Search(String),
    Add(Pick),
    Scan(String),
    Quantity { line: usize, quantity: i64 },
    LineDiscount { line: usize, amount: Money },
    Remove { line: usize },
    Discount(Discount),
    Customer { phone: String, name: Option<String> },
    Unlink,
    Customers(String),
    Note(String),
    Cart,
    Json,
    Checkout,
    Edit,
    Pay {
        payment_type: Option<PaymentType>,
        amount: Option<Money>,
        reference: Option<String>,
    },
    Receipt(Option<String>),
    Clear,
    Quit,
}

/// 1-based list position to a 0-based index.
fn position(n: usize) -> ApiResult<usize> {
    n.checked_sub(1)
        .ok_or_else(|| ApiError::validation("Positions start at 1"))
}

fn line_arg(arg: Option<&str>) -> ApiResult<usize> {
    let arg = arg.ok_or_else(|| ApiError::validation("Line number is required"))?;
    let n = arg
        .parse::<usize>()
        .map_err(|_| ApiError::validation(format!("'{}' is not a line number", arg)))?;
    position(n)
}

fn required<'a>(arg: Option<&'a str>, what: &str) -> ApiResult<&'a str> {
    arg.ok_or_else(|| ApiError::validation(format!("{} is required", what)))
}

fn parse_discount(arg: &str, currency: &CurrencyFormat) -> ApiResult<Discount> {
    if arg.eq_ignore_ascii_case("none") {
        return Ok(Discount::NONE);
    }
    if arg.ends_with('%') {
        return Ok(Discount::percent(parse_percentage(arg)?)?);
    }
    Ok(Discount::fixed(currency.parse_amount(arg)?)?)
}

/// Parses one input line; blank lines give `None`.
pub fn parse_command(line: &str, currency: &CurrencyFormat) -> ApiResult<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let first = rest.first().copied();
    let tail = |from: usize| rest.get(from..).map(|w| w.join(" ")).unwrap_or_default();

    let command = match verb.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "login" => Command::Login {
            email: required(first, "Email")?.to_string(),
            password: required(rest.get(1).copied(), "Password")?.to_string(),
        },
        "logout" => Command::Logout,
        "stores" => Command::Stores,
        "use" => Command::Use(Pick::parse(required(first, "Store")?)?),
        "search" => Command::Search(tail(0)),
        "add" => Command::Add(Pick::parse(required(first, "Product")?)?),
        "scan" => Command::Scan(required(first, "Barcode")?.to_string()),
        "qty" => {
            let line = line_arg(first)?;
            let quantity = required(rest.get(1).copied(), "Quantity")?;
            let quantity = quantity
                .parse::<i64>()
                .map_err(|_| ApiError::validation(format!("'{}' is not a quantity", quantity)))?;
            Command::Quantity { line, quantity }
        }
        "disc" => Command::LineDiscount {
            line: line_arg(first)?,
            amount: currency.parse_amount(&tail(1))?,
        },
        "rm" => Command::Remove {
            line: line_arg(first)?,
        },
        "discount" => Command::Discount(parse_discount(&tail(0), currency)?),
        "customer" => match first {
            Some(arg) if arg.eq_ignore_ascii_case("none") => Command::Unlink,
            Some(phone) => Command::Customer {
                phone: phone.to_string(),
                name: Some(tail(1)).filter(|n| !n.is_empty()),
            },
            None => return Err(ApiError::validation("Phone is required")),
        },
        "customers" => Command::Customers(tail(0)),
        "note" => Command::Note(tail(0)),
        "cart" => Command::Cart,
        "json" => Command::Json,
        "checkout" => Command::Checkout,
        "edit" => Command::Edit,
        "pay" => {
            let mut payment_type = None;
            let mut amount = None;
            let mut reference = Vec::new();
            for word in &rest {
                if payment_type.is_none() && amount.is_none() {
                    if let Ok(parsed) = word.parse::<PaymentType>() {
                        payment_type = Some(parsed);
                        continue;
                    }
                }
                if amount.is_none() && reference.is_empty() {
                    if let Ok(parsed) = currency.parse_amount(word) {
                        amount = Some(parsed);
                        continue;
                    }
                }
                reference.push(*word);
            }
            Command::Pay {
                payment_type,
                amount,
                reference: Some(reference.join(" ")).filter(|r| !r.is_empty()),
            }
        }
        "receipt" => Command::Receipt(first.map(str::to_string)),
        "clear" => Command::Clear,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown command '{}', type 'help'",
                other
            )))
        }
    };
    Ok(Some(command))
}

// =============================================================================
// Rendering
// =============================================================================

/// The cart as the cashier sees it.
pub fn render_cart(cart: &CartResponse, currency: &CurrencyFormat) -> String {
    let money = |m: Money| format_money(m, currency);

    if cart.lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for (i, line) in cart.lines.iter().enumerate() {
        let product = line.product();
        out.push_str(&format!(
            "{:>3}. {:<24} {:>4} x {:>12} {:>14}\n",
            i + 1,
            product.name,
            line.quantity(),
            money(product.price),
            money(line.total()),
        ));
        if !line.effective_discount().is_zero() {
            out.push_str(&format!(
                "     {:<24} {:>33}\n",
                "discount",
                format!("-{}", money(line.effective_discount()))
            ));
        }
        if product.is_low_stock() {
            out.push_str(&format!("     low stock: {} {} left\n", product.stock, product.unit));
        }
    }

    let totals = &cart.totals;
    out.push_str(&format!("{:<30}{:>32}\n", "Subtotal", money(totals.subtotal)));
    if !totals.discount_amount.is_zero() {
        let label = match cart.discount {
            Discount::Percent { rate } => format!("Discount ({})", rate),
            Discount::Fixed { .. } => "Discount".to_string(),
        };
        out.push_str(&format!(
            "{:<30}{:>32}\n",
            label,
            format!("-{}", money(totals.discount_amount))
        ));
    }
    out.push_str(&format!("{:<30}{:>32}\n", "TOTAL", money(totals.total)));

    if let Some(customer) = &cart.customer {
        out.push_str(&format!("Customer: {}", customer.name));
        if let Some(phone) = &customer.phone {
            out.push_str(&format!(" ({})", phone));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{} line(s), {} item(s), {:?}",
        totals.item_count, totals.total_quantity, totals.phase
    ));
    out
}

// =============================================================================
// Console
// =============================================================================

/// Dispatches parsed commands against one session.
pub struct Console<B> {
    session: PosSession<B>,
    last_search: Mutex<Vec<Product>>,
}

impl<B: PosBackend> Console<B> {
    pub fn new(session: PosSession<B>) -> Self {
        Console {
            session,
            last_search: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &PosSession<B> {
        &self.session
    }

    fn currency(&self) -> &CurrencyFormat {
        &self.session.config().currency
    }

    fn money(&self, amount: Money) -> String {
        format_money(amount, self.currency())
    }

    fn cart_text(&self, cart: &CartResponse) -> String {
        render_cart(cart, self.currency())
    }

    fn line_id(&self, line: usize) -> ApiResult<Uuid> {
        self.session
            .cart
            .with_cart(|c| c.lines().get(line).map(|l| l.product_id()))
            .ok_or_else(|| ApiError::validation(format!("No line {}", line + 1)))
    }

    /// Parses and runs one line. `Ok(None)` means quit.
    pub async fn execute(&self, line: &str) -> ApiResult<Option<String>> {
        match parse_command(line, self.currency())? {
            None => Ok(Some(String::new())),
            Some(Command::Quit) => Ok(None),
            Some(command) => self.handle(command).await.map(Some),
        }
    }

    pub async fn handle(&self, command: Command) -> ApiResult<String> {
        debug!(?command, "console command");
        let session = &self.session;

        match command {
            Command::Help => Ok(HELP.to_string()),
            Command::Login { email, password } => {
                let user = auth::login(session, &email, &password).await?;
                let mut text = format!("Welcome, {}", user.full_name);
                match session.outlet.active() {
                    Some(store) => text.push_str(&format!("\nStore: {}", store.name)),
                    None => text.push_str("\nType 'stores' then 'use <n>' to pick a store"),
                }
                Ok(text)
            }
            Command::Logout => {
                auth::logout(session);
                Ok("Signed out".to_string())
            }
            Command::Stores => {
                let stores = auth::list_stores(session).await?;
                let active = session.outlet.active().map(|s| s.id);
                Ok(stores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let marker = if Some(s.id) == active { "*" } else { " " };
                        format!("{}{:>3}. {} (tax {})", marker, i + 1, s.name, s.tax_rate)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Use(pick) => {
                let store_id = match pick {
                    Pick::Id(id) => id,
                    Pick::Index(i) => session
                        .outlet
                        .stores()
                        .get(i)
                        .map(|s| s.id)
                        .ok_or_else(|| ApiError::validation(format!("No store {}", i + 1)))?,
                };
                let store = auth::select_store(session, store_id)?;
                Ok(format!("Store: {}", store.name))
            }
            Command::Search(query) => {
                let products = cart::search_products(session, &query).await?;
                let text = products
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        format!(
                            "{:>3}. {:<24} {:>12}  stock {}",
                            i + 1,
                            p.name,
                            self.money(p.price),
                            p.stock
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                *self
                    .last_search
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = products;
                Ok(if text.is_empty() { "No products found".to_string() } else { text })
            }
            Command::Add(pick) => {
                let product_id = match pick {
                    Pick::Id(id) => id,
                    Pick::Index(i) => self
                        .last_search
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get(i)
                        .map(|p| p.id)
                        .ok_or_else(|| ApiError::validation(format!("No search result {}", i + 1)))?,
                };
                let cart = cart::add_product(session, product_id).await?;
                Ok(self.cart_text(&cart))
            }
            Command::Scan(code) => {
                let cart = cart::scan_barcode(session, &code).await?;
                Ok(self.cart_text(&cart))
            }
            Command::Quantity { line, quantity } => {
                let cart = cart::update_quantity(session, self.line_id(line)?, quantity)?;
                Ok(self.cart_text(&cart))
            }
            Command::LineDiscount { line, amount } => {
                let cart = cart::update_line_discount(session, self.line_id(line)?, amount)?;
                Ok(self.cart_text(&cart))
            }
            Command::Remove { line } => {
                let cart = cart::remove_item(session, self.line_id(line)?)?;
                Ok(self.cart_text(&cart))
            }
            Command::Discount(discount) => {
                let cart = cart::set_discount(session, discount)?;
                Ok(self.cart_text(&cart))
            }
            Command::Customer { phone, name } => {
                let customer =
                    cart::link_customer_by_phone(session, &phone, name.as_deref()).await?;
                Ok(format!(
                    "Customer: {} ({} purchases, {} spent)",
                    customer.name,
                    customer.total_transactions,
                    self.money(customer.total_spent)
                ))
            }
            Command::Unlink => {
                let cart = cart::set_customer(session, None);
                Ok(self.cart_text(&cart))
            }
            Command::Customers(query) => {
                let customers = cart::search_customers(session, &query).await?;
                if customers.is_empty() {
                    return Ok("No customers found".to_string());
                }
                Ok(customers
                    .iter()
                    .map(|c| format!("{:<24} {}", c.name, c.phone.as_deref().unwrap_or("-")))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Note(text) => {
                sale::set_notes(session, &text);
                Ok("Noted".to_string())
            }
            Command::Cart => Ok(self.cart_text(&cart::get_cart(session))),
            Command::Json => serde_json::to_string_pretty(&cart::get_cart(session))
                .map_err(|e| ApiError::internal(e.to_string())),
            Command::Checkout => {
                let checkout = sale::begin_checkout(session)?;
                let quick = checkout
                    .quick_cash
                    .iter()
                    .map(|m| self.money(*m))
                    .collect::<Vec<_>>()
                    .join(" | ");
                Ok(format!(
                    "Due: {}\nTendered: {}\nQuick cash: {}",
                    self.money(checkout.total),
                    self.money(checkout.payment_amount),
                    quick
                ))
            }
            Command::Edit => {
                sale::resume_editing(session)?;
                Ok(self.cart_text(&cart::get_cart(session)))
            }
            Command::Pay {
                payment_type,
                amount,
                reference,
            } => {
                let (current_type, current_amount) = session
                    .cart
                    .with_cart(|c| (c.payment_type(), c.payment_amount()));
                sale::set_payment(
                    session,
                    payment_type.unwrap_or(current_type),
                    amount.unwrap_or(current_amount),
                )?;
                if reference.is_some() {
                    sale::set_payment_reference(session, reference);
                }

                let sale = sale::pay(session).await?;
                let tx = &sale.transaction;
                let mut text = format!(
                    "{} {}\nTotal: {}  (tax {})\nPaid:  {} {}\nChange: {}",
                    tx.invoice_number,
                    tx.status,
                    self.money(tx.total),
                    self.money(tx.tax_amount),
                    self.money(tx.payment_amount),
                    tx.payment_type,
                    self.money(tx.change_amount)
                );
                if let Some(phone) = &sale.receipt_phone {
                    text.push_str(&format!("\nType 'receipt' to send it to {}", phone));
                }
                Ok(text)
            }
            Command::Receipt(phone) => {
                let request = sale::send_receipt(session, None, phone.as_deref()).await?;
                Ok(format!("Receipt sent to {}", request.phone))
            }
            Command::Clear => Ok(self.cart_text(&cart::clear_cart(session)?)),
            Command::Quit => Ok(String::new()),
        }
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub async fn run_stdin(&self) -> ApiResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Kasir POS. Type 'help' for commands.");

        loop {
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| ApiError::internal(e.to_string()))?
            else {
                break;
            };

            match self.execute(&line).await {
                Ok(Some(text)) if text.is_empty() => {}
                Ok(Some(text)) => println!("{}", text),
                Ok(None) => break,
                Err(e) => println!("error {:?}: {}", e.code, e.message),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idr() -> CurrencyFormat {
        CurrencyFormat::for_code("IDR")
    }

    fn parse(line: &str) -> Command {
        parse_command(line, &idr()).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line_is_none() {
        assert!(parse_command("   ", &idr()).unwrap().is_none());
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        assert_eq!(parse("qty 2 5"), Command::Quantity { line: 1, quantity: 5 });
        assert_eq!(parse("rm 1"), Command::Remove { line: 0 });
        assert!(parse_command("rm 0", &idr()).is_err());
        assert!(parse_command("rm x", &idr()).is_err());
    }

    #[test]
    fn test_discount_forms() {
        assert_eq!(parse("discount none"), Command::Discount(Discount::NONE));
        assert_eq!(
            parse("discount 10%"),
            Command::Discount(Discount::Percent {
                rate: kasir_core::Percentage::from_percent(10)
            })
        );
        assert_eq!(
            parse("discount 5.000"),
            Command::Discount(Discount::Fixed { amount: Money::from_minor(5_000) })
        );
        assert!(parse_command("discount 120%", &idr()).is_err());
    }

    #[test]
    fn test_line_discount_amount() {
        assert_eq!(
            parse("disc 1 Rp 2.500"),
            Command::LineDiscount { line: 0, amount: Money::from_minor(2_500) }
        );
    }

    #[test]
    fn test_pay_arguments() {
        assert_eq!(
            parse("pay"),
            Command::Pay { payment_type: None, amount: None, reference: None }
        );
        assert_eq!(
            parse("pay 50000"),
            Command::Pay {
                payment_type: None,
                amount: Some(Money::from_minor(50_000)),
                reference: None
            }
        );
        assert_eq!(
            parse("pay qris 18000 QR-7781"),
            Command::Pay {
                payment_type: Some(PaymentType::Qris),
                amount: Some(Money::from_minor(18_000)),
                reference: Some("QR-7781".to_string())
            }
        );
    }

    #[test]
    fn test_customer_forms() {
        assert_eq!(parse("customer none"), Command::Unlink);
        assert_eq!(
            parse("customer 081234567890 Budi Santoso"),
            Command::Customer {
                phone: "081234567890".to_string(),
                name: Some("Budi Santoso".to_string())
            }
        );
        assert_eq!(
            parse("customer 081234567890"),
            Command::Customer { phone: "081234567890".to_string(), name: None }
        );
    }

    #[test]
    fn test_pick_by_index_or_id() {
        assert_eq!(parse("use 1"), Command::Use(Pick::Index(0)));
        let id = Uuid::new_v4();
        assert_eq!(parse(&format!("add {}", id)), Command::Add(Pick::Id(id)));
        assert!(parse_command("add kopi", &idr()).is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_command("refund 1", &idr()).unwrap_err();
        assert!(err.message.contains("refund"));
    }

    #[test]
    fn test_render_empty_cart() {
        let cart = CartResponse::from(&kasir_core::Cart::new());
        assert_eq!(render_cart(&cart, &idr()), "Cart is empty");
    }
}
