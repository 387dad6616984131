//! Errors raised without touching storage.
//!
//! `ValidationError` describes one rejected field of caller input.
//! `CoreError` adds the graph lookups that can miss. The db crate folds both
//! into its own `DbError`, so callers of the repositories only see one type.

use thiserror::Error;

use crate::types::{OrderId, ProductId};

/// Failure of a pure operation on products, orders or the association graph.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The graph holds no product with this id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The graph holds no order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A single field of caller input that was refused.
///
/// Every variant names the field, so a serving layer can point at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Text that does not parse, such as a price with three decimals.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// The offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entities_name_the_id() {
        assert_eq!(
            CoreError::ProductNotFound(ProductId::new(42)).to_string(),
            "Product not found: 42"
        );
        assert_eq!(
            CoreError::OrderNotFound(OrderId::new(7)).to_string(),
            "Order not found: 7"
        );
    }

    #[test]
    fn test_messages_lead_with_the_field() {
        let cases = [
            (
                ValidationError::Required { field: "name".into() },
                "name is required",
            ),
            (
                ValidationError::MustBePositive { field: "page_size".into() },
                "page_size must be positive",
            ),
            (
                ValidationError::OutOfRange { field: "page_size".into(), min: 1, max: 1000 },
                "page_size must be between 1 and 1000",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(message.starts_with(err.field()));
        }
    }

    #[test]
    fn test_validation_lifts_into_core_error() {
        let err: CoreError = ValidationError::TooLong { field: "name".into(), max: 255 }.into();

        match err {
            CoreError::Validation(inner) => assert_eq!(inner.field(), "name"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
