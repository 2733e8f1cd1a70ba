//! # Store Error Types
//!
//! Error types for document store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure (remote down, disk error, bad JSON)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module)                                               │
//! │       │                                                                 │
//! │       ├── Unavailable ──► LayeredStore falls back to the local cache    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller shows a retry prompt; a submitted order is never dropped        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use dinedesk_core::CoreError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be reached right now.
    ///
    /// ## When This Occurs
    /// - Remote store offline or timing out
    /// - Local cache directory not writable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Document not found.
    #[error("{collection} not found: {id}")]
    NotFound { collection: String, id: String },

    /// Document could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// File system error in a file-backed store.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid or unreadable configuration.
    #[error("Invalid store configuration: {0}")]
    Config(String),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend lock was poisoned by a panicking writer.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error for a collection and document id.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Returns true if a fallback store may serve the operation instead.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<dinedesk_core::ValidationError> for StoreError {
    fn from(err: dinedesk_core::ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_allows_fallback() {
        assert!(StoreError::Unavailable("offline".into()).is_unavailable());
        assert!(!StoreError::not_found("orders", "o1").is_unavailable());
        assert!(!StoreError::Io("disk full".into()).is_unavailable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            StoreError::not_found("orders", "o1").to_string(),
            "orders not found: o1"
        );
        let core: StoreError = CoreError::EmptyCart.into();
        assert_eq!(core.to_string(), CoreError::EmptyCart.to_string());
    }
}
