//! # Domain Types
//!
//! Entities of the storefront's commerce state.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    StockLine    │   │    CartLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  product_id     │◄──│  size_id        │       │
//! │  │  price          │   │  id (size id)   │   │  user_id        │       │
//! │  │  total_quantity │   │  quantity       │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   │  selected       │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderLine     │   │    Address      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  order_id       │   │  user_id        │       │
//! │  │  total_price    │   │  *_snapshot     │   │  is_default     │       │
//! │  │  status         │   │  (frozen copy)  │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings generated before insert. User ids are
//! supplied by the authentication layer and trusted as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product and its aggregate stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Current unit price in the smallest currency unit.
    pub price: i64,
    /// Sum of this product's stock lines. Maintained by the same
    /// transaction that changes a stock line, never recomputed.
    pub total_quantity: i64,
    /// Thumbnail shown in the cart and frozen onto order lines.
    pub image_url: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Available quantity for one size of one product.
///
/// Identified by `(product_id, id)`. `quantity` never goes below zero: the
/// only writer is the order commit, which decrements conditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLine {
    /// Size id.
    pub id: String,
    pub product_id: String,
    pub size_name: String,
    pub quantity: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// A user's intent to buy `quantity` of one product size.
///
/// Unique per `(user_id, product_id, size_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub size_id: String,
    /// Positive; clamped to the stock line when written.
    pub quantity: i64,
    /// Included in the next checkout.
    pub selected: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with current catalog data.
///
/// This is what checkout reads: `price`, `product_name`, `image_url` and
/// `size_name` are the values that get frozen onto the order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub cart_line_id: String,
    pub product_id: String,
    pub size_id: String,
    pub quantity: i64,
    pub selected: bool,
    pub product_name: String,
    /// Current catalog price, not a price remembered by the cart.
    pub price: i64,
    pub image_url: String,
    pub size_name: String,
    /// Stock line quantity at read time.
    pub available_quantity: i64,
}

impl CartItem {
    /// Returns the current unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.price)
    }

    /// `quantity × price`, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price().checked_mul_qty(self.quantity)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order lifecycle status.
///
/// Orders are created `Delivering`; later transitions belong to the
/// administrative side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum OrderStatus {
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Delivering,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// The stored name of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Delivering
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

/// A committed order. Immutable except for `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    /// Σ(quantity × price) over the order's lines at commit time.
    pub total_price: i64,
    pub payment_method: String,
    /// Free-text snapshot of the delivery address, not a reference.
    pub address: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_price)
    }
}

/// A purchased line, frozen at commit time.
///
/// Later catalog edits never change what a past order displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at commit time.
    pub price: i64,
    pub image_url: String,
    pub size_id: String,
    pub size_name: String,
}

impl OrderLine {
    /// `quantity × price`, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        Money::from_minor(self.price).checked_mul_qty(self.quantity)
    }
}

/// An order together with its lines, as shown in order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved delivery address.
///
/// Per user, at most one address has `is_default = true`, and the first
/// address a user creates is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub city: String,
    pub district: String,
    pub ward: String,
    pub street: String,
    pub house_number: String,
    pub is_default: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Single-line form used as the order's address snapshot.
    pub fn one_line(&self) -> String {
        [
            self.house_number.as_str(),
            self.street.as_str(),
            self.ward.as_str(),
            self.district.as_str(),
            self.city.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Address fields accepted on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddressInput {
    pub city: String,
    pub district: String,
    pub ward: String,
    pub street: String,
    pub house_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, price: i64) -> CartItem {
        CartItem {
            cart_line_id: "c1".to_string(),
            product_id: "p1".to_string(),
            size_id: "s1".to_string(),
            quantity,
            selected: true,
            product_name: "Linen Shirt".to_string(),
            price,
            image_url: "https://cdn.example/shirt.jpg".to_string(),
            size_name: "M".to_string(),
            available_quantity: 10,
        }
    }

    #[test]
    fn test_cart_item_subtotal() {
        assert_eq!(item(2, 100).subtotal(), Some(Money::from_minor(200)));
        assert_eq!(item(2, i64::MAX).subtotal(), None);
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!(
            "Delivering".parse::<OrderStatus>().unwrap(),
            OrderStatus::Delivering
        );
        assert_eq!(
            " delivered ".parse::<OrderStatus>().unwrap(),
            OrderStatus::Delivered
        );
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Delivering);
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_address_one_line_skips_blank_parts() {
        let now = Utc::now();
        let address = Address {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            city: "Hanoi".to_string(),
            district: "Ba Dinh".to_string(),
            ward: " ".to_string(),
            street: "Kim Ma".to_string(),
            house_number: "12".to_string(),
            is_default: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(address.one_line(), "12, Kim Ma, Ba Dinh, Hanoi");
    }

    #[test]
    fn test_order_details_flattens_order() {
        let now = Utc::now();
        let details = OrderDetails {
            order: Order {
                id: "o1".to_string(),
                user_id: "u1".to_string(),
                total_price: 250,
                payment_method: "Cash".to_string(),
                address: "12 Kim Ma".to_string(),
                status: OrderStatus::Delivering,
                created_at: now,
                updated_at: now,
            },
            lines: vec![],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["total_price"], 250);
        assert_eq!(json["status"], "Delivering");
        assert!(json["lines"].as_array().unwrap().is_empty());
    }
}
