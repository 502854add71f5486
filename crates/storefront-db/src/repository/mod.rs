//! # Repository Module
//!
//! One repository per slice of commerce state.
//!
//! ## Write Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Repository          Writes                     Atomic scope            │
//! │  ──────────          ──────                     ────────────            │
//! │  CatalogRepository   products, product_sizes    add_size (tx)           │
//! │  StockLedger         product_sizes, totals      caller's tx only        │
//! │  CartRepository      cart_lines                 single statements       │
//! │  OrderRepository     orders, order_lines,       commit (tx)             │
//! │                      stock debit, cart delete                           │
//! │  AddressRepository   addresses                  set_default (tx)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock quantities change only through `StockLedger::debit` during an order
//! commit, or when `add_size` opens a new stock line.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products and sizes
//! - [`StockLedger`](stock::StockLedger) - Stock reads and the conditional debit
//! - [`CartRepository`](cart::CartRepository) - Clamped add-to-cart and cart edits
//! - [`OrderRepository`](order::OrderRepository) - Checkout and order history
//! - [`AddressRepository`](address::AddressRepository) - Address book and default swap

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod stock;
