//! # Stock Ledger
//!
//! Per-(product, size) available quantities and the per-product total.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Debit Strategy                                       │
//! │                                                                         │
//! │  ❌ WRONG: read, compare, then write (check-then-act race)              │
//! │     SELECT quantity ...            -- both checkouts read 1             │
//! │     UPDATE ... SET quantity = 0    -- both succeed, one item oversold   │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                  │
//! │     UPDATE product_sizes                                                │
//! │     SET quantity = quantity - :n                                        │
//! │     WHERE id = :size AND product_id = :product AND quantity >= :n       │
//! │                                                                         │
//! │     rows_affected = 1 → debited                                         │
//! │     rows_affected = 0 → InsufficientStock (or unknown stock line)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`StockLedger::debit`] takes an open transaction, so it can only run
//! inside a caller's atomic scope; a failed debit is returned to that caller,
//! whose transaction then rolls back.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{CoreError, StockLine, ValidationError};

/// Read access to stock, plus the transactional debit.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Returns the available quantity of one product size.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such stock line
    pub async fn available_quantity(&self, product_id: &str, size_id: &str) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT quantity
            FROM product_sizes
            WHERE id = ?1 AND product_id = ?2
            "#,
        )
        .bind(size_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        quantity.ok_or_else(|| stock_line_not_found(product_id, size_id))
    }

    /// Returns the product's aggregate quantity across all sizes.
    pub async fn total_quantity(&self, product_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total_quantity FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        total.ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Gets one stock line.
    pub async fn get_line(&self, product_id: &str, size_id: &str) -> DbResult<Option<StockLine>> {
        let line = sqlx::query_as::<_, StockLine>(
            r#"
            SELECT id, product_id, size_name, quantity
            FROM product_sizes
            WHERE id = ?1 AND product_id = ?2
            "#,
        )
        .bind(size_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Debits `amount` from a stock line and its product total.
    ///
    /// ## Contract
    /// - Fails (never clamps) when `amount` exceeds the available quantity
    /// - Both the stock line and the product total change, or neither does
    ///   once the caller rolls back
    /// - Runs inside the caller's transaction; nothing is committed here
    ///
    /// ## Errors
    /// * `CoreError::InsufficientStock` - `amount > available`
    /// * `DbError::NotFound` - unknown stock line or product
    pub async fn debit(
        tx: &mut Transaction<'_, Sqlite>,
        product_id: &str,
        size_id: &str,
        amount: i64,
    ) -> DbResult<()> {
        if amount <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "debit amount".to_string(),
            }
            .into());
        }

        debug!(product_id = %product_id, size_id = %size_id, amount, "Debiting stock");

        let result = sqlx::query(
            r#"
            UPDATE product_sizes
            SET quantity = quantity - ?1
            WHERE id = ?2 AND product_id = ?3 AND quantity >= ?1
            "#,
        )
        .bind(amount)
        .bind(size_id)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            // Same transaction, so this sees the value the update compared against
            let available: Option<i64> = sqlx::query_scalar(
                "SELECT quantity FROM product_sizes WHERE id = ?1 AND product_id = ?2",
            )
            .bind(size_id)
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;

            return Err(match available {
                None => stock_line_not_found(product_id, size_id),
                Some(available) => CoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    size_id: size_id.to_string(),
                    available,
                    requested: amount,
                }
                .into(),
            });
        }

        adjust_total(tx, product_id, -amount).await
    }

    /// Creates a stock line with its initial quantity and raises the product
    /// total by the same amount.
    pub(crate) async fn open_line(
        tx: &mut Transaction<'_, Sqlite>,
        line: &StockLine,
    ) -> DbResult<()> {
        if line.quantity < 0 {
            return Err(ValidationError::OutOfRange {
                field: "stock quantity".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        // Write the product row first so a missing product is a NotFound,
        // not a foreign key failure
        adjust_total(tx, &line.product_id, line.quantity).await?;

        sqlx::query(
            r#"
            INSERT INTO product_sizes (id, product_id, size_name, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&line.id)
        .bind(&line.product_id)
        .bind(&line.size_name)
        .bind(line.quantity)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

async fn adjust_total(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    delta: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET total_quantity = total_quantity + ?1,
            updated_at = ?2
        WHERE id = ?3
        "#,
    )
    .bind(delta)
    .bind(Utc::now())
    .bind(product_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(())
}

fn stock_line_not_found(product_id: &str, size_id: &str) -> DbError {
    DbError::not_found("Stock line", format!("{product_id}/{size_id}"))
}
