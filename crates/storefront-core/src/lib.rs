//! # storefront-core: Pure Commerce Logic
//!
//! Domain types and rules for the storefront's shared commerce state:
//! stock lines, cart lines, orders with their snapshot lines, and addresses.
//! Nothing in this crate performs I/O; `storefront-db` applies these rules
//! inside its transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Presentation layer (HTTP/JSON, external)               │   │
//! │  │   add-to-cart ──► checkout ──► order history ──► addresses     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ verified user id                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               storefront-db (transactions)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ CartLine  │  │   Money   │  │  clamp    │  │   rules   │  │   │
//! │  │   │  Order    │  │  totals   │  │ snapshot  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (StockLine, CartLine, Order, OrderLine, Address, ...)
//! - [`money`] - Integer money with overflow-checked arithmetic
//! - [`cart`] - Clamp rule, order totals and order-line snapshots
//! - [`error`] - Domain errors and the caller-facing [`ErrorKind`] taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::cart::clamp_quantity;
//!
//! // Two add-to-cart requests of 5 against a stock line holding 2
//! let first = clamp_quantity(0, 5, 2);
//! let second = clamp_quantity(first, 5, 2);
//! assert_eq!(second, 2);
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

/// Status every order is created with.
pub const INITIAL_ORDER_STATUS: OrderStatus = OrderStatus::Delivering;

/// Maximum quantity accepted in a single add-to-cart request.
///
/// The stock ceiling clamps anything lower; this only rejects obviously
/// mistyped input before it reaches the database.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of the free-text address snapshot stored on an order.
pub const MAX_ADDRESS_LEN: usize = 500;
