//! End-to-end checkout scenarios against a real SQLite database.

use std::path::PathBuf;

use storefront_core::{AddressInput, CoreError, ErrorKind, Money, OrderStatus};
use storefront_db::{Database, DbConfig, DbError};
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

/// A WAL database file that is removed when dropped.
struct TempDb {
    db: Database,
    path: PathBuf,
}

impl TempDb {
    async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("storefront-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        TempDb { db, path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

struct Sku {
    product_id: String,
    size_id: String,
}

async fn sku(db: &Database, name: &str, price: i64, size: &str, stock: i64) -> Sku {
    let product = db
        .catalog()
        .insert_product(name, price, &format!("https://cdn.storefront.local/{name}.jpg"))
        .await
        .unwrap();
    let size = db.catalog().add_size(&product.id, size, stock).await.unwrap();
    Sku {
        product_id: product.id,
        size_id: size.id,
    }
}

async fn add_to_cart(db: &Database, user_id: &str, sku: &Sku, quantity: i64, selected: bool) {
    let cart = db.cart();
    let line = cart
        .upsert(user_id, &sku.product_id, &sku.size_id, quantity)
        .await
        .unwrap()
        .unwrap();
    if selected {
        cart.update(user_id, &line.id, line.quantity, true)
            .await
            .unwrap();
    }
}

async fn available(db: &Database, sku: &Sku) -> i64 {
    db.stock()
        .available_quantity(&sku.product_id, &sku.size_id)
        .await
        .unwrap()
}

async fn total(db: &Database, sku: &Sku) -> i64 {
    db.stock().total_quantity(&sku.product_id).await.unwrap()
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

// =============================================================================
// Order Commit
// =============================================================================

#[tokio::test]
async fn test_commit_debits_stock_and_consumes_selected_lines() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 5).await;
    let b = sku(db, "Scarf", 50, "S2", 3).await;
    let b_large = db.catalog().add_size(&b.product_id, "L", 4).await.unwrap();

    add_to_cart(db, "u1", &a, 2, true).await;
    add_to_cart(db, "u1", &b, 1, true).await;
    // Same product, other size, left unselected
    let unselected = Sku {
        product_id: b.product_id.clone(),
        size_id: b_large.id.clone(),
    };
    add_to_cart(db, "u1", &unselected, 1, false).await;

    let placed = db.orders().place_order("u1", "COD", "12 Kim Ma, Hanoi").await.unwrap();

    assert_eq!(placed.order.total_price, 250);
    assert_eq!(placed.order.status, OrderStatus::Delivering);
    let line_sum: Money = placed.lines.iter().map(|l| l.subtotal().unwrap()).sum();
    assert_eq!(line_sum, placed.order.total());

    assert_eq!(available(db, &a).await, 3);
    assert_eq!(available(db, &b).await, 2);
    assert_eq!(total(db, &a).await, 3);
    assert_eq!(total(db, &b).await, 6);
    assert_eq!(available(db, &unselected).await, 4);

    let remaining = db.cart().list("u1", false).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].size_id, b_large.id);
    assert!(!remaining[0].selected);

    let names: Vec<_> = placed.lines.iter().map(|l| l.product_name.as_str()).collect();
    assert_eq!(names, ["Shirt", "Scarf"]);
    assert_eq!(placed.lines[0].size_name, "S1");
    assert_eq!(placed.lines[0].image_url, "https://cdn.storefront.local/Shirt.jpg");
    assert_eq!(count(db, "order_lines").await, 2);
}

#[tokio::test]
async fn test_failed_commit_has_no_effects() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 5).await;
    let b = sku(db, "Scarf", 50, "S2", 3).await;

    add_to_cart(db, "u1", &a, 2, true).await;
    add_to_cart(db, "u1", &b, 3, true).await;

    // Someone else buys one Scarf after u1 filled the cart
    add_to_cart(db, "u2", &b, 1, true).await;
    db.orders().place_order("u2", "COD", "1 Hang Bai").await.unwrap();

    let err = db.orders().place_order("u1", "COD", "12 Kim Ma").await.unwrap_err();

    match &err {
        DbError::Core(CoreError::InsufficientStock {
            size_id,
            available,
            requested,
            ..
        }) => {
            assert_eq!(size_id, &b.size_id);
            assert_eq!(*available, 2);
            assert_eq!(*requested, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // The Shirt line was debited before the Scarf failed; nothing of it stayed
    assert_eq!(available(db, &a).await, 5);
    assert_eq!(total(db, &a).await, 5);
    assert_eq!(available(db, &b).await, 2);
    assert!(db.orders().list_for_user("u1").await.unwrap().is_empty());
    assert_eq!(count(db, "orders").await, 1);
    assert_eq!(count(db, "order_lines").await, 1);
    assert_eq!(db.cart().list("u1", true).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_commits_never_oversell() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 1).await;

    add_to_cart(db, "u1", &a, 1, true).await;
    add_to_cart(db, "u2", &a, 1, true).await;

    let orders_1 = db.orders();
    let orders_2 = db.orders();
    let (first, second) = tokio::join!(
        orders_1.place_order("u1", "COD", "12 Kim Ma"),
        orders_2.place_order("u2", "COD", "1 Hang Bai"),
    );

    let (winners, losers): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(Result::is_ok);
    assert_eq!(winners.len(), 1);
    assert_eq!(losers.len(), 1);

    let err = losers.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_insufficient_stock(), "unexpected error: {err:?}");

    assert_eq!(available(db, &a).await, 0);
    assert_eq!(total(db, &a).await, 0);
    assert_eq!(count(db, "orders").await, 1);
    assert_eq!(count(db, "order_lines").await, 1);
    assert_eq!(count(db, "cart_lines").await, 1);
}

#[tokio::test]
async fn test_order_snapshot_survives_catalog_edits() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 5).await;

    add_to_cart(db, "u1", &a, 1, true).await;
    let placed = db.orders().place_order("u1", "COD", "12 Kim Ma").await.unwrap();

    db.catalog()
        .update_product(&a.product_id, "Shirt (2027)", 180, "new.jpg")
        .await
        .unwrap();

    let stored = db
        .orders()
        .get("u1", &placed.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.order.total_price, 100);
    assert_eq!(stored.lines[0].product_name, "Shirt");
    assert_eq!(stored.lines[0].price, 100);
    assert_eq!(stored.lines[0].image_url, "https://cdn.storefront.local/Shirt.jpg");

    // A new checkout prices at the current catalog price
    add_to_cart(db, "u1", &a, 1, true).await;
    let next = db.orders().place_order("u1", "COD", "12 Kim Ma").await.unwrap();
    assert_eq!(next.order.total_price, 180);
}

#[tokio::test]
async fn test_order_details_json_shape() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 5).await;

    add_to_cart(db, "u1", &a, 2, true).await;
    let placed = db.orders().place_order("u1", "COD", "12 Kim Ma").await.unwrap();

    let json = serde_json::to_value(&placed).unwrap();
    assert_eq!(json["total_price"], 200);
    assert_eq!(json["status"], "Delivering");
    assert_eq!(json["lines"][0]["quantity"], 2);
}

// =============================================================================
// Cart Clamp
// =============================================================================

#[tokio::test]
async fn test_repeated_add_to_cart_clamps_at_stock() {
    let t = TempDb::new().await;
    let db = &t.db;
    let a = sku(db, "Shirt", 100, "S1", 2).await;

    let cart = db.cart();
    cart.upsert("u1", &a.product_id, &a.size_id, 5).await.unwrap();
    let line = cart
        .upsert("u1", &a.product_id, &a.size_id, 5)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(line.quantity, 2);
    assert_eq!(available(db, &a).await, 2);
}

// =============================================================================
// Default Address
// =============================================================================

#[tokio::test]
async fn test_default_address_swap() {
    let t = TempDb::new().await;
    let addresses = t.db.addresses();
    let input = |street: &str| AddressInput {
        city: "Hanoi".to_string(),
        district: "Ba Dinh".to_string(),
        ward: "Kim Ma".to_string(),
        street: street.to_string(),
        house_number: "12".to_string(),
    };

    let x = addresses.add("u1", &input("Lieu Giai")).await.unwrap();
    let y = addresses.add("u1", &input("Doi Can")).await.unwrap();
    assert!(x.is_default);
    assert!(!y.is_default);

    addresses.set_default("u1", &y.id).await.unwrap();

    let x = addresses.get("u1", &x.id).await.unwrap().unwrap();
    let y = addresses.get("u1", &y.id).await.unwrap().unwrap();
    assert!(!x.is_default);
    assert!(y.is_default);

    let err = addresses.delete("u1", &y.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    addresses.delete("u1", &x.id).await.unwrap();

    let default = addresses.get_default("u1").await.unwrap().unwrap();
    assert_eq!(default.one_line(), "12, Doi Can, Kim Ma, Ba Dinh, Hanoi");
}
