//! End-to-end cashier flows against the in-memory backend.

use kasir_cashier::commands::{auth, cart, sale};
use kasir_cashier::console::Console;
use kasir_cashier::error::ErrorCode;
use kasir_cashier::session::PosSession;
use kasir_client::{ClientConfig, ClientError, InMemoryBackend};
use kasir_core::{CartPhase, Discount, Money, PaymentType, Percentage, Product, Store};
use uuid::Uuid;

const EMAIL: &str = "kasir@toko.id";
const PASSWORD: &str = "rahasia";

fn product(name: &str, barcode: &str, price: i64, stock: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        barcode: Some(barcode.to_string()),
        sku: None,
        category_id: None,
        category_name: None,
        price: Money::from_minor(price),
        cost: Money::zero(),
        stock,
        min_stock: 0,
        unit: "pcs".to_string(),
        is_active: true,
        track_stock: true,
    }
}

struct Fixture {
    backend: InMemoryBackend,
    session: PosSession<InMemoryBackend>,
    store: Store,
    kopi: Product,
    roti: Product,
}

/// Signed in, single store selected, two products on the shelf.
async fn fixture(tax: Percentage) -> Fixture {
    let backend = InMemoryBackend::new();
    backend.add_account(EMAIL, PASSWORD, "Rina");
    let store = backend.add_store("Toko Makmur", tax);

    let kopi = product("Kopi Susu", "899100", 10_000, 10);
    let roti = product("Roti Tawar", "899200", 8_000, 1);
    backend.add_product(store.id, kopi.clone());
    backend.add_product(store.id, roti.clone());

    let session = PosSession::new(backend.clone(), ClientConfig::default());
    auth::login(&session, EMAIL, PASSWORD).await.unwrap();

    Fixture {
        backend,
        session,
        store,
        kopi,
        roti,
    }
}

#[tokio::test]
async fn test_login_selects_the_only_store() {
    let f = fixture(Percentage::zero()).await;
    assert!(f.session.auth.is_authenticated());
    assert_eq!(f.session.outlet.active().unwrap().id, f.store.id);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let backend = InMemoryBackend::new();
    backend.add_account(EMAIL, PASSWORD, "Rina");
    let session = PosSession::new(backend, ClientConfig::default());

    let err = auth::login(&session, EMAIL, "salah").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);
    assert!(!session.auth.is_authenticated());

    let err = auth::login(&session, "  ", PASSWORD).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_scan_requires_login_and_store() {
    let backend = InMemoryBackend::new();
    let session = PosSession::new(backend, ClientConfig::default());

    let err = cart::scan_barcode(&session, "899100").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);
}

#[tokio::test]
async fn test_scan_same_barcode_twice_merges_lines() {
    let f = fixture(Percentage::zero()).await;

    cart::scan_barcode(&f.session, "899100").await.unwrap();
    let cart = cart::scan_barcode(&f.session, " 899100 ").await.unwrap();

    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity(), 2);
    assert_eq!(cart.totals.subtotal.minor(), 20_000);
}

#[tokio::test]
async fn test_failed_lookup_leaves_cart_untouched() {
    let f = fixture(Percentage::zero()).await;
    cart::scan_barcode(&f.session, "899100").await.unwrap();
    let before = cart::get_cart(&f.session);

    let err = cart::scan_barcode(&f.session, "000000").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    f.backend.fail_next(ClientError::Timeout);
    let err = cart::scan_barcode(&f.session, "899200").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Network);

    let err = cart::scan_barcode(&f.session, "not a barcode!").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    assert_eq!(cart::get_cart(&f.session), before);
}

#[tokio::test]
async fn test_inactive_product_is_rejected() {
    let f = fixture(Percentage::zero()).await;
    let mut retired = product("Permen Lama", "899900", 500, 50);
    retired.is_active = false;
    f.backend.add_product(f.store.id, retired);

    let err = cart::scan_barcode(&f.session, "899900").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(cart::get_cart(&f.session).lines.is_empty());
}

#[tokio::test]
async fn test_full_sale_with_discount_and_change() {
    let f = fixture(Percentage::zero()).await;

    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    cart::set_discount(
        &f.session,
        Discount::Percent {
            rate: Percentage::from_percent(10),
        },
    )
    .unwrap();

    let checkout = sale::begin_checkout(&f.session).unwrap();
    assert_eq!(checkout.total.minor(), 18_000);
    assert_eq!(checkout.payment_amount.minor(), 18_000);
    assert_eq!(
        checkout.quick_cash,
        vec![
            Money::from_minor(18_000),
            Money::from_minor(50_000),
            Money::from_minor(100_000),
            Money::from_minor(200_000)
        ]
    );

    let paid = sale::set_payment(&f.session, PaymentType::Cash, Money::from_minor(20_000)).unwrap();
    assert_eq!(paid.change.minor(), 2_000);

    let settled = sale::pay(&f.session).await.unwrap();
    assert_eq!(settled.transaction.total.minor(), 18_000);
    assert_eq!(settled.transaction.change_amount.minor(), 2_000);
    assert_eq!(settled.transaction.status, "completed");

    let after = cart::get_cart(&f.session);
    assert_eq!(after.totals.phase, CartPhase::Empty);
    assert_eq!(f.backend.product(f.store.id, f.kopi.id).unwrap().stock, 8);
    assert_eq!(f.session.last_sale().unwrap().transaction.id, settled.transaction.id);
}

#[tokio::test]
async fn test_short_payment_is_rejected_before_submission() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    cart::set_discount(
        &f.session,
        Discount::Percent {
            rate: Percentage::from_percent(10),
        },
    )
    .unwrap();

    sale::begin_checkout(&f.session).unwrap();
    sale::set_payment(&f.session, PaymentType::Cash, Money::from_minor(15_000)).unwrap();

    let err = sale::pay(&f.session).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientPayment);
    assert!(f.backend.transactions(f.store.id).is_empty());
    assert_eq!(
        cart::get_cart(&f.session).totals.phase,
        CartPhase::AwaitingPayment
    );
}

#[tokio::test]
async fn test_backend_rejection_keeps_cart() {
    let f = fixture(Percentage::from_percent(11)).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();

    // Prefill is the pre-tax total; the backend adds 11% and refuses.
    sale::begin_checkout(&f.session).unwrap();
    let err = sale::pay(&f.session).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Rejected);

    let kept = cart::get_cart(&f.session);
    assert_eq!(kept.lines.len(), 1);
    assert_eq!(kept.totals.phase, CartPhase::AwaitingPayment);

    sale::set_payment(&f.session, PaymentType::Cash, Money::from_minor(11_100)).unwrap();
    let settled = sale::pay(&f.session).await.unwrap();
    assert_eq!(settled.transaction.tax_amount.minor(), 1_100);
    assert!(cart::get_cart(&f.session).lines.is_empty());
}

#[tokio::test]
async fn test_insufficient_stock_is_rejected_by_backend() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.roti.id).await.unwrap();
    cart::add_product(&f.session, f.roti.id).await.unwrap();

    sale::begin_checkout(&f.session).unwrap();
    let err = sale::pay(&f.session).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Rejected);
    assert!(err.message.contains("Insufficient stock"));
    assert_eq!(cart::get_cart(&f.session).lines.len(), 1);
}

#[tokio::test]
async fn test_cart_is_frozen_while_awaiting_payment() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    sale::begin_checkout(&f.session).unwrap();

    let err = cart::scan_barcode(&f.session, "899200").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CartFrozen);
    let err = cart::update_quantity(&f.session, f.kopi.id, 5).unwrap_err();
    assert_eq!(err.code, ErrorCode::CartFrozen);

    sale::resume_editing(&f.session).unwrap();
    let cart = cart::update_quantity(&f.session, f.kopi.id, 5).unwrap();
    assert_eq!(cart.totals.total.minor(), 50_000);
}

#[tokio::test]
async fn test_checkout_on_empty_cart() {
    let f = fixture(Percentage::zero()).await;
    let err = sale::begin_checkout(&f.session).unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);
}

#[tokio::test]
async fn test_receipt_goes_to_linked_customer() {
    let f = fixture(Percentage::zero()).await;
    let customer = cart::link_customer_by_phone(&f.session, "0812-3456-7890", Some("Budi"))
        .await
        .unwrap();
    assert_eq!(customer.phone.as_deref(), Some("081234567890"));

    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    sale::begin_checkout(&f.session).unwrap();
    let settled = sale::pay(&f.session).await.unwrap();
    assert_eq!(settled.receipt_phone.as_deref(), Some("081234567890"));

    let stored = f
        .backend
        .customer_by_phone(f.store.id, "081234567890")
        .unwrap();
    assert_eq!(stored.total_transactions, 1);
    assert_eq!(stored.total_spent.minor(), 10_000);

    let request = sale::send_receipt(&f.session, None, None).await.unwrap();
    assert_eq!(request.transaction_id, settled.transaction.id);
    assert_eq!(request.phone, "081234567890");
    assert_eq!(f.backend.receipts().len(), 1);
}

#[tokio::test]
async fn test_receipt_without_phone_is_a_validation_error() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    sale::begin_checkout(&f.session).unwrap();
    sale::pay(&f.session).await.unwrap();

    let err = sale::send_receipt(&f.session, None, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = sale::send_receipt(&f.session, None, Some("12ab")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let request = sale::send_receipt(&f.session, None, Some("+62 812 3456 7890"))
        .await
        .unwrap();
    assert_eq!(request.phone, "+6281234567890");
}

#[tokio::test]
async fn test_unauthorized_signs_out() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();

    f.backend.revoke_tokens();
    let err = cart::scan_barcode(&f.session, "899100").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);

    assert!(!f.session.auth.is_authenticated());
    assert!(f.session.outlet.active().is_none());
    assert!(cart::get_cart(&f.session).lines.is_empty());
}

#[tokio::test]
async fn test_switching_store_clears_cart() {
    let f = fixture(Percentage::zero()).await;
    let cabang = f.backend.add_store("Cabang", Percentage::zero());
    cart::add_product(&f.session, f.kopi.id).await.unwrap();

    let stores = auth::list_stores(&f.session).await.unwrap();
    assert_eq!(stores.len(), 2);

    auth::select_store(&f.session, f.store.id).unwrap();
    assert_eq!(cart::get_cart(&f.session).lines.len(), 1);

    auth::select_store(&f.session, cabang.id).unwrap();
    assert!(cart::get_cart(&f.session).lines.is_empty());

    let err = auth::select_store(&f.session, Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_console_session() {
    let f = fixture(Percentage::zero()).await;
    let console = Console::new(f.session);

    let text = console.execute("scan 899100").await.unwrap().unwrap();
    assert!(text.contains("Kopi Susu"));
    assert!(text.contains("Rp 10.000"));

    console.execute("qty 1 2").await.unwrap();
    console.execute("discount 10%").await.unwrap();

    let text = console.execute("checkout").await.unwrap().unwrap();
    assert!(text.contains("Due: Rp 18.000"));

    let text = console.execute("pay 20000").await.unwrap().unwrap();
    assert!(text.contains("INV-"));
    assert!(text.contains("Change: Rp 2.000"));

    let err = console.execute("rm 1").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    assert!(console.execute("quit").await.unwrap().is_none());
}

#[tokio::test]
async fn test_oversized_quantity_is_rejected() {
    let f = fixture(Percentage::zero()).await;
    let console = Console::new(f.session);
    console.execute("scan 899100").await.unwrap();
    console.execute("qty 1 3").await.unwrap();

    let err = console.execute("qty 1 9223372036854775807").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(err.message.contains("at most"));

    let snapshot = console.session().cart.snapshot();
    assert_eq!(snapshot.lines()[0].quantity(), 3);
    assert_eq!(snapshot.total().minor(), 30_000);

    let text = console.execute("cart").await.unwrap().unwrap();
    assert!(text.contains("Rp 30.000"));
}

#[tokio::test]
async fn test_cart_is_held_while_a_payment_is_in_flight() {
    let f = fixture(Percentage::zero()).await;
    cart::add_product(&f.session, f.kopi.id).await.unwrap();
    sale::begin_checkout(&f.session).unwrap();

    let in_flight = f.session.cart.begin_submission().unwrap();

    let err = sale::pay(&f.session).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CartFrozen);
    assert_eq!(sale::resume_editing(&f.session).unwrap_err().code, ErrorCode::CartFrozen);
    assert_eq!(cart::clear_cart(&f.session).unwrap_err().code, ErrorCode::CartFrozen);
    let err = auth::select_store(&f.session, f.store.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::CartFrozen);

    assert_eq!(f.session.cart.snapshot().phase(), CartPhase::AwaitingPayment);
    assert!(f.backend.transactions(f.store.id).is_empty());

    drop(in_flight);
    let sale = sale::pay(&f.session).await.unwrap();
    assert_eq!(sale.transaction.total.minor(), 10_000);
    assert!(!f.session.cart.is_submitting());
    assert_eq!(f.session.cart.snapshot().phase(), CartPhase::Empty);
}
