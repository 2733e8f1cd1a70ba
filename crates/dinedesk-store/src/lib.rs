//! # dinedesk-store: Storage Layer for Dinedesk
//!
//! Document storage for orders, the menu and restaurant settings, with a
//! device-local cache that keeps ordering working while the remote store is
//! unreachable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dinedesk Data Flow                               │
//! │                                                                         │
//! │  Frontend command (place order, change status, edit menu)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  dinedesk-store (THIS CRATE)                    │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Storage     │    │  Repositories │    │   Backends   │    │    │
//! │  │   │ (storage.rs)  │───►│ OrderRepo     │───►│ MemoryStore  │    │    │
//! │  │   │               │    │ MenuRepo      │    │ JsonFileStore│    │    │
//! │  │   │ StoreConfig   │    │ SettingsRepo  │    │ LayeredStore │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Remote document store  +  <data_dir>/*.json on the device              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`document`] - The `DocumentStore` port and change subscriptions
//! - [`memory`] - In-memory backend (remote stand-in, tests)
//! - [`file`] - JSON-file backend (device cache)
//! - [`layered`] - Remote-first store with local fallback
//! - [`migrate`] - Bulk copy and wipe across stores
//! - [`repository`] - Orders, menu and settings
//! - [`storage`] - Backend selection and repository access
//! - [`config`] - Store configuration
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dinedesk_store::{Storage, StoreConfig};
//!
//! let storage = Storage::open(StoreConfig::load_or_default(None))?;
//! let policy = storage.settings().discount_policy()?;
//! let order = storage.orders().create(cart.snapshot(), &policy, &request, &Local::now())?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod document;
pub mod error;
pub mod file;
pub mod layered;
pub mod memory;
pub mod migrate;
pub mod repository;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{StoreConfig, StoreMode};
pub use document::{Change, ChangeKind, Document, DocumentStore, DocumentStoreExt, Subscription};
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use layered::LayeredStore;
pub use memory::MemoryStore;
pub use storage::Storage;

// Repository re-exports for convenience
pub use repository::menu::{MenuRepository, MoveDirection};
pub use repository::orders::{OrderRepository, Tombstone};
pub use repository::settings::SettingsRepository;
