//! # dinedesk-core: Ordering and Pricing Logic for Dinedesk
//!
//! Everything Dinedesk computes lives here as pure functions over in-memory
//! data. Storage, the UI and the clock are all outside.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dinedesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React)                             │   │
//! │  │   Menu ──► Option dialog ──► Cart ──► Checkout ──► Admin views  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ts-rs bindings                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ dinedesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │  │ pricing │ │  cart   │ │ discount │ │  order  │ │  prep   │  │   │
//! │  │  │ options │ │ totals  │ │  tiers   │ │ pickup  │ │ report  │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               dinedesk-store (Storage Port)                     │   │
//! │  │       document store trait, backends, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Menu, cart line, order and settings data model
//! - [`money`] - Integer-cent money with tenth rounding
//! - [`pricing`] - Unit-price resolution and option selections
//! - [`discount`] - Ordered discount tiers
//! - [`cart`] - Cart mutations and totals
//! - [`order`] - Checkout, pickup codes and status lifecycle
//! - [`prep`] - Kitchen preparation aggregation
//! - [`report`] - Sales statistics
//! - [`validation`] - Input rules checked before any write
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use dinedesk_core::{compute_cart_totals, CartLine, DiscountPolicy, MenuItem};
//!
//! let item = MenuItem {
//!     id: "1".into(),
//!     name: "黄焖鸡米饭".into(),
//!     description: String::new(),
//!     price_cents: 5000,
//!     image_url: String::new(),
//!     category: "1".into(),
//!     available: true,
//!     custom_options: vec![],
//! };
//! let line = CartLine {
//!     id: "1-default-0".into(),
//!     menu_item: item,
//!     quantity: 3,
//!     variant: None,
//!     special: None,
//!     unit_price_cents: None,
//! };
//!
//! // €150.00 reaches the 10% tier
//! let totals = compute_cart_totals(&[line], &DiscountPolicy::default());
//! assert_eq!(totals.discount.savings_cents, 1500);
//! assert_eq!(totals.total_cents, 13500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod prep;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{compute_cart_totals, Cart, CartTotals};
pub use discount::{AppliedDiscount, DiscountKind, DiscountPolicy, DiscountTier};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{place_order, NewOrder};
pub use prep::{aggregate_preparation_stats, DishStats};
pub use pricing::{resolve_unit_price, SelectedOption, Selection};
pub use report::{sales_report, SalesReport, TimeRange};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single cart line.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Group name shown for orders stored before group names were collected.
pub const UNKNOWN_GROUP_NAME: &str = "未知群昵称";

/// Separator between option tokens in a line's special text.
pub const SPECIAL_DELIMITER: &str = "、";
