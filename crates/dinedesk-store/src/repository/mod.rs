//! # Repository Module
//!
//! Typed access to the document collections.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend command                                                       │
//! │       │                                                                 │
//! │       │  storage.orders().update_status(id, Ready, now)                 │
//! │       ▼                                                                 │
//! │  OrderRepository / MenuRepository / SettingsRepository                  │
//! │       │  decode, tombstone filtering, business rules from core          │
//! │       ▼                                                                 │
//! │  Arc<dyn DocumentStore>  (memory, JSON files or layered)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](orders::OrderRepository) - Orders, status changes, tombstones
//! - [`MenuRepository`](menu::MenuRepository) - Menu items and categories
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value settings and the cart

pub mod menu;
pub mod orders;
pub mod settings;
