//! # Error Types
//!
//! Domain-specific error types for dinedesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dinedesk-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input the customer or staff must fix            │
//! │                                                                         │
//! │  dinedesk-store errors (separate crate)                                 │
//! │  └── StoreError       - Backend unavailable, (de)serialization, I/O     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → frontend message      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing and aggregation never produce errors: they degrade to base prices
//! and coarser statistics instead.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart line id does not exist in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Staff tried a status change outside the lifecycle.
    ///
    /// ## When This Occurs
    /// - Completing an order that is still pending
    /// - Cancelling an order that is already ready or completed
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// Status string from a stored record or request is unknown.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Recovered locally: the caller refuses to proceed and names the field(s).
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

    /// Required option groups left without a selection.
    ///
    /// ## User Workflow
    /// ```text
    /// Customize dish ──► "Add to cart"
    ///      │
    ///      ▼
    /// validate_selection ──► MissingSelections { groups: ["份量"] }
    ///      │
    ///      ▼
    /// UI shows: "请选择必选项：份量"
    /// ```
    #[error("Missing required selection: {}", .groups.join("、"))]
    MissingSelections { groups: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStatusTransition {
            order_id: "o-1".to_string(),
            from: "ready".to_string(),
            to: "cancelled".to_string(),
        };
        assert_eq!(err.to_string(), "Order o-1 cannot move from ready to cancelled");
    }

    #[test]
    fn test_missing_selections_names_every_group() {
        let err = ValidationError::MissingSelections {
            groups: vec!["份量".to_string(), "辣度".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required selection: 份量、辣度");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "groupName".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
