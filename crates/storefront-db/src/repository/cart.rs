//! # Cart Repository
//!
//! Cart lines per user. Adding to the cart never touches stock.
//!
//! ## Upsert Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert(user, product, size, requested)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  available = stock line quantity ── no stock line? → NotFound           │
//! │       │                                                                 │
//! │       ├── available = 0 → remove any existing line, return None         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ... ON CONFLICT (user_id, product_id, size_id) DO UPDATE        │
//! │     new line:      quantity = min(requested, available)                 │
//! │     existing line: quantity = min(existing + requested, available)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartLine (selected = false for new lines)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clamp is a ceiling, not a reservation: two users can both hold the
//! last unit in their carts. Checkout decides who gets it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::stock::StockLedger;
use storefront_core::cart::clamp_quantity;
use storefront_core::validation::{validate_quantity, validate_user_id};
use storefront_core::{CartItem, CartLine};

const CART_LINE_COLUMNS: &str =
    "id, user_id, product_id, size_id, quantity, selected, created_at, updated_at";

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Merges `requested` units into the user's cart line for a product size.
    ///
    /// ## Returns
    /// * `Ok(Some(CartLine))` - The line after clamping to available stock
    /// * `Ok(None)` - The size is sold out; no line is kept
    /// * `Err(DbError::NotFound)` - No such product size
    pub async fn upsert(
        &self,
        user_id: &str,
        product_id: &str,
        size_id: &str,
        requested: i64,
    ) -> DbResult<Option<CartLine>> {
        validate_user_id(user_id)?;
        validate_quantity(requested)?;

        let available = StockLedger::new(self.pool.clone())
            .available_quantity(product_id, size_id)
            .await?;

        debug!(
            user_id = %user_id,
            product_id = %product_id,
            size_id = %size_id,
            requested,
            available,
            "Upserting cart line"
        );

        // A new line gets the same ceiling an existing one would
        let initial = clamp_quantity(0, requested, available);
        if initial == 0 {
            self.remove(user_id, product_id, size_id).await?;
            return Ok(None);
        }

        let now = Utc::now();

        // ON CONFLICT branch is clamp_quantity(existing, requested, available)
        let line = sqlx::query_as::<_, CartLine>(&format!(
            r#"
            INSERT INTO cart_lines (
                id, user_id, product_id, size_id, quantity, selected, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
            ON CONFLICT (user_id, product_id, size_id) DO UPDATE SET
                quantity = MAX(MIN(cart_lines.quantity + ?7, ?8), 1),
                updated_at = ?6
            RETURNING {CART_LINE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(product_id)
        .bind(size_id)
        .bind(initial)
        .bind(now)
        .bind(requested)
        .bind(available)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(line))
    }

    /// Lists the user's cart joined with current catalog data, oldest first.
    ///
    /// With `selected_only`, returns exactly the lines the next checkout
    /// would purchase.
    pub async fn list(&self, user_id: &str, selected_only: bool) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT
                c.id AS cart_line_id,
                c.product_id,
                c.size_id,
                c.quantity,
                c.selected,
                p.name AS product_name,
                p.price,
                p.image_url,
                s.size_name,
                s.quantity AS available_quantity
            FROM cart_lines c
            JOIN products p ON p.id = c.product_id
            JOIN product_sizes s ON s.id = c.size_id AND s.product_id = c.product_id
            WHERE c.user_id = ?1
              AND (?2 = 0 OR c.selected = 1)
            ORDER BY c.created_at, c.rowid
            "#,
        )
        .bind(user_id)
        .bind(selected_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets one of the user's cart lines.
    pub async fn get(&self, user_id: &str, cart_line_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_lines WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(cart_line_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Overwrites a cart line's quantity and selection.
    ///
    /// A quantity of zero or less deletes the line. Larger quantities are
    /// clamped to current stock like [`upsert`](Self::upsert); a sold-out
    /// size also deletes the line.
    ///
    /// ## Returns
    /// * `Ok(Some(CartLine))` - Updated line
    /// * `Ok(None)` - Line deleted
    /// * `Err(DbError::NotFound)` - Not one of the user's lines
    pub async fn update(
        &self,
        user_id: &str,
        cart_line_id: &str,
        quantity: i64,
        selected: bool,
    ) -> DbResult<Option<CartLine>> {
        let line = self
            .get(user_id, cart_line_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart line", cart_line_id))?;

        let available = StockLedger::new(self.pool.clone())
            .available_quantity(&line.product_id, &line.size_id)
            .await?;

        let quantity = clamp_quantity(0, quantity, available);
        if quantity == 0 {
            self.delete(user_id, cart_line_id).await?;
            return Ok(None);
        }

        debug!(cart_line_id = %cart_line_id, quantity, selected, "Updating cart line");

        let updated = sqlx::query_as::<_, CartLine>(&format!(
            r#"
            UPDATE cart_lines
            SET quantity = ?3,
                selected = ?4,
                updated_at = ?5
            WHERE id = ?1 AND user_id = ?2
            RETURNING {CART_LINE_COLUMNS}
            "#
        ))
        .bind(cart_line_id)
        .bind(user_id)
        .bind(quantity)
        .bind(selected)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        // Gone between the read and the write: consumed by a checkout
        updated
            .map(Some)
            .ok_or_else(|| DbError::not_found("Cart line", cart_line_id))
    }

    /// Deletes one of the user's cart lines.
    pub async fn delete(&self, user_id: &str, cart_line_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1 AND user_id = ?2")
            .bind(cart_line_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", cart_line_id));
        }

        Ok(())
    }

    async fn remove(&self, user_id: &str, product_id: &str, size_id: &str) -> DbResult<()> {
        sqlx::query(
            "DELETE FROM cart_lines WHERE user_id = ?1 AND product_id = ?2 AND size_id = ?3",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
