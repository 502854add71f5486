//! # Order Repository
//!
//! Checkout and order history.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Commit Transaction                             │
//! │                                                                         │
//! │  place_order(user, payment, address)                                    │
//! │       │                                                                 │
//! │       ├── cart().list(user, selected_only) ← current catalog prices     │
//! │       ├── order_total(items)                ← EmptySelection if none    │
//! │       ▼                                                                 │
//! │  commit(user, items, total, payment, address)                           │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────┐       │
//! │  │  INSERT orders (status = Delivering)                         │       │
//! │  │  for each item, in read order:                               │       │
//! │  │     INSERT order_lines (snapshot of name/price/image/size)   │       │
//! │  │     StockLedger::debit(product, size, quantity)  ── fails ──►│ROLLBACK│
//! │  │     DELETE cart_lines (the consumed line)        ── gone  ──►│ROLLBACK│
//! │  COMMIT ────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Either the order, its lines, every debit and every cart deletion       │
//! │  persist together, or none of them do.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retries
//! There is no idempotency key. A retry after a successful commit finds no
//! selected lines (`EmptySelection`); a retry racing the first attempt fails
//! when it tries to delete a cart line the first attempt already consumed.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cart::CartRepository;
use crate::repository::stock::StockLedger;
use storefront_core::cart::{new_order, order_total, snapshot_line};
use storefront_core::validation::{
    validate_address_text, validate_payment_method, validate_user_id,
};
use storefront_core::{
    CartItem, Money, Order, OrderDetails, OrderLine, OrderStatus, ValidationError,
};

const ORDER_COLUMNS: &str =
    "id, user_id, total_price, payment_method, address, status, created_at, updated_at";

const ORDER_LINE_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, price, image_url, size_id, size_name";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Checks out the user's selected cart lines.
    ///
    /// Reads the selection with current catalog prices, totals it, then runs
    /// [`commit`](Self::commit).
    pub async fn place_order(
        &self,
        user_id: &str,
        payment_method: &str,
        address: &str,
    ) -> DbResult<OrderDetails> {
        validate_user_id(user_id)?;

        let items = CartRepository::new(self.pool.clone())
            .list(user_id, true)
            .await?;
        let total = order_total(&items)?;

        self.commit(user_id, &items, total, payment_method, address)
            .await
    }

    /// Turns the given selected cart items into an order.
    ///
    /// `total` must equal `Σ(quantity × price)` over `items`, computed from
    /// current catalog prices just before the call.
    ///
    /// ## Errors
    /// * `CoreError::EmptySelection` - `items` is empty
    /// * `CoreError::InsufficientStock` - a line exceeds current stock
    /// * `DbError::NotFound` - a cart line was already consumed or removed
    /// * `DbError::TransactionFailed` and other storage errors
    ///
    /// Every error leaves the database as it was before the call.
    pub async fn commit(
        &self,
        user_id: &str,
        items: &[CartItem],
        total: Money,
        payment_method: &str,
        address: &str,
    ) -> DbResult<OrderDetails> {
        validate_user_id(user_id)?;
        validate_payment_method(payment_method)?;
        validate_address_text(address)?;

        let expected = order_total(items)?;
        if expected != total {
            return Err(ValidationError::InvalidFormat {
                field: "total_price".to_string(),
                reason: format!("expected {expected}, got {total}"),
            }
            .into());
        }

        let order = new_order(user_id, total, payment_method, address, Utc::now());

        debug!(
            order_id = %order.id,
            user_id = %user_id,
            lines = items.len(),
            total = %total,
            "Committing order"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        match write_order(&mut tx, &order, items).await {
            Ok(lines) => {
                tx.commit().await.map_err(DbError::transaction)?;

                info!(
                    order_id = %order.id,
                    user_id = %user_id,
                    total = %total,
                    lines = lines.len(),
                    "Order placed"
                );

                Ok(OrderDetails { order, lines })
            }
            Err(e) => {
                warn!(order_id = %order.id, user_id = %user_id, error = %e, "Order aborted");
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed; connection discards the transaction");
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Lists the user's orders, newest first, with their lines.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<OrderDetails>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = self.lines(&order.id).await?;
            details.push(OrderDetails { order, lines });
        }

        Ok(details)
    }

    /// Gets one of the user's orders with its lines.
    pub async fn get(&self, user_id: &str, order_id: &str) -> DbResult<Option<OrderDetails>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => {
                let lines = self.lines(&order.id).await?;
                Ok(Some(OrderDetails { order, lines }))
            }
            None => Ok(None),
        }
    }

    /// Sets an order's status. Administrative; not scoped to a user.
    ///
    /// Only the status changes; totals and lines are immutable.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> DbResult<Order> {
        debug!(order_id = %order_id, status = %status, "Updating order status");

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = ?2,
                updated_at = ?3
            WHERE id = ?1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        order.ok_or_else(|| DbError::not_found("Order", order_id))
    }

    async fn lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Writes the order, then snapshot/debit/consume per item. The first write
/// takes the database write lock, so the debits below see committed stock.
async fn write_order(
    tx: &mut Transaction<'_, Sqlite>,
    order: &Order,
    items: &[CartItem],
) -> DbResult<Vec<OrderLine>> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, total_price, payment_method, address, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.total_price)
    .bind(&order.payment_method)
    .bind(&order.address)
    .bind(order.status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let line = snapshot_line(&order.id, item);
        insert_line(tx, &line).await?;

        StockLedger::debit(tx, &item.product_id, &item.size_id, item.quantity).await?;

        consume_cart_line(tx, &order.user_id, item).await?;

        lines.push(line);
    }

    Ok(lines)
}

async fn insert_line(tx: &mut Transaction<'_, Sqlite>, line: &OrderLine) -> DbResult<()> {
    sqlx::query(&format!(
        r#"
        INSERT INTO order_lines ({ORDER_LINE_COLUMNS})
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#
    ))
    .bind(&line.id)
    .bind(&line.order_id)
    .bind(&line.product_id)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.price)
    .bind(&line.image_url)
    .bind(&line.size_id)
    .bind(&line.size_name)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Deletes the purchased cart line. The line must still be selected, for the
/// product size and quantity that were just debited; anything else means it
/// changed underneath or `item` does not describe it.
async fn consume_cart_line(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    item: &CartItem,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_lines
        WHERE id = ?1
          AND user_id = ?2
          AND quantity = ?3
          AND product_id = ?4
          AND size_id = ?5
          AND selected = 1
        "#,
    )
    .bind(&item.cart_line_id)
    .bind(user_id)
    .bind(item.quantity)
    .bind(&item.product_id)
    .bind(&item.size_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Cart line", &item.cart_line_id));
    }

    Ok(())
}
