//! # Validation Module
//!
//! Input validation applied before any storage access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (HTTP/JSON)                                     │
//! │  └── Deserialization, authentication                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Quantities, ids, free-text fields                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0) on stock lines                              │
//! │  ├── UNIQUE (user_id, product_id, size_id) on cart lines               │
//! │  └── one default address per user (partial unique index)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::AddressInput;
use crate::{MAX_ADDRESS_LEN, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PAYMENT_METHOD_LEN: usize = 50;
const MAX_ADDRESS_FIELD_LEN: usize = 100;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates the user id handed over by the authentication layer.
///
/// Only emptiness is checked; the id is otherwise trusted.
pub fn validate_user_id(user_id: &str) -> ValidationResult<()> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested add-to-cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an initial stock quantity for a new stock line.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed.
pub fn validate_price(price: i64) -> ValidationResult<()> {
    if price < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("product_name", name, MAX_NAME_LEN)
}

/// Validates a size name such as "M" or "42".
pub fn validate_size_name(name: &str) -> ValidationResult<()> {
    required("size_name", name, MAX_NAME_LEN)
}

/// Validates the checkout payment method.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    required("payment_method", method, MAX_PAYMENT_METHOD_LEN)
}

/// Validates the free-text address snapshot stored on an order.
pub fn validate_address_text(address: &str) -> ValidationResult<()> {
    required("address", address, MAX_ADDRESS_LEN)
}

/// Validates address-book fields. Every part is required.
pub fn validate_address_input(input: &AddressInput) -> ValidationResult<()> {
    required("city", &input.city, MAX_ADDRESS_FIELD_LEN)?;
    required("district", &input.district, MAX_ADDRESS_FIELD_LEN)?;
    required("ward", &input.ward, MAX_ADDRESS_FIELD_LEN)?;
    required("street", &input.street, MAX_ADDRESS_FIELD_LEN)?;
    required("house_number", &input.house_number, MAX_ADDRESS_FIELD_LEN)?;
    Ok(())
}
