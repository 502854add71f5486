//! # Error Types
//!
//! Domain error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                        │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── ErrorKind        - Caller-facing taxonomy                          │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorKind → HTTP code    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing error classification.
///
/// The presentation layer maps these to HTTP status codes and user messages,
/// e.g. `Conflict` for "out of stock" versus `Transient` for "try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// Referenced product, size, address, cart line or order does not exist
    /// for this user.
    NotFound,
    /// The request is well-formed but conflicts with current state.
    Conflict,
    /// Underlying storage I/O failure; the request may be retried.
    Transient,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stock line cannot cover the quantity being committed.
    ///
    /// ## When This Occurs
    /// The cart was clamped when the line was added, but another checkout
    /// consumed stock before this one committed:
    /// ```text
    /// Add to cart (qty 1, stock 1)   ──► cart line qty 1
    /// Other user checks out qty 1    ──► stock 0
    /// Checkout                       ──► InsufficientStock { available: 0, requested: 1 }
    /// ```
    #[error(
        "Insufficient stock for product {product_id} size {size_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        size_id: String,
        available: i64,
        requested: i64,
    },

    /// Checkout was requested with no selected cart lines.
    #[error("No cart lines are selected for checkout")]
    EmptySelection,

    /// The address is the user's current default and cannot be deleted.
    #[error("Address {address_id} is the default address and cannot be deleted")]
    CannotDeleteDefault { address_id: String },

    /// A monetary computation overflowed.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error for the presentation layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InsufficientStock { .. } | CoreError::CannotDeleteDefault { .. } => {
                ErrorKind::Conflict
            }
            CoreError::EmptySelection
            | CoreError::AmountOverflow { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage access, so they never leave partial writes.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            size_id: "s1".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p1 size s1: available 0, requested 1"
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CoreError::EmptySelection.kind(), ErrorKind::Validation);
        assert_eq!(
            CoreError::CannotDeleteDefault {
                address_id: "a1".to_string()
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "address".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_error_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }
}
