//! # Cart Rules
//!
//! Pure rules shared by add-to-cart and checkout.
//!
//! ## Clamp vs. Debit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add-to-cart                         checkout                           │
//! │  ───────────                         ────────                           │
//! │  clamp_quantity(existing, req, avail)   debit(qty) inside transaction   │
//! │   → caps silently at the stock line     → fails if qty > available      │
//! │   → reserves nothing                    → aborts the whole order        │
//! │                                                                         │
//! │  A clamped cart line can go stale: stock may drop before checkout.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartItem, Order, OrderLine};
use crate::INITIAL_ORDER_STATUS;

/// Merges a requested quantity into an existing cart quantity, capped at the
/// stock line's available quantity.
///
/// Requesting more than is available is not an error; the result is the
/// ceiling. Pass `existing = 0` for a new cart line.
///
/// ## Example
/// ```rust
/// use storefront_core::cart::clamp_quantity;
///
/// assert_eq!(clamp_quantity(0, 5, 2), 2);
/// assert_eq!(clamp_quantity(2, 5, 2), 2);
/// assert_eq!(clamp_quantity(1, 1, 10), 2);
/// ```
pub fn clamp_quantity(existing: i64, requested: i64, available: i64) -> i64 {
    existing.saturating_add(requested).min(available).max(0)
}

/// Computes `Σ(quantity × price)` over the given items.
///
/// Rejects an empty selection and any overflow.
pub fn order_total(items: &[CartItem]) -> CoreResult<Money> {
    if items.is_empty() {
        return Err(CoreError::EmptySelection);
    }

    items.iter().try_fold(Money::zero(), |total, item| {
        item.subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("order total (cart line {})", item.cart_line_id),
            })
    })
}

/// Builds the order row for a checkout. Status is always the initial one.
pub fn new_order(
    user_id: &str,
    total: Money,
    payment_method: &str,
    address: &str,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        total_price: total.minor(),
        payment_method: payment_method.trim().to_string(),
        address: address.trim().to_string(),
        status: INITIAL_ORDER_STATUS,
        created_at: now,
        updated_at: now,
    }
}

/// Freezes a cart item into an order line.
///
/// ## Snapshot Pattern
/// Product name, unit price, thumbnail and size name are copied so the order
/// keeps displaying what was bought even if the catalog changes later.
pub fn snapshot_line(order_id: &str, item: &CartItem) -> OrderLine {
    OrderLine {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        product_id: item.product_id.clone(),
        product_name: item.product_name.clone(),
        quantity: item.quantity,
        price: item.price,
        image_url: item.image_url.clone(),
        size_id: item.size_id.clone(),
        size_name: item.size_name.clone(),
    }
}
