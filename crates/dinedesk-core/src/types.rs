//! # Domain Types
//!
//! Core domain types shared by the pricing engine, the order lifecycle and
//! the storage layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │   OptionGroup   │   │   MenuOption    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │──►│  type tag       │──►│  id, name       │       │
//! │  │  price_cents    │   │  title (key)    │   │  price_cents?   │       │
//! │  │  category       │   │  required       │   │  is_default     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │          │ snapshot (copied at add time)                                │
//! │          ▼                                                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │──►│      Order      │   │   OrderStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  Pending        │       │
//! │  │  quantity       │   │  pickup_code    │   │  Preparing      │       │
//! │  │  variant        │   │  totals         │   │  Ready          │       │
//! │  │  special        │   │  group_name     │   │  Completed      │       │
//! │  │  unit_price?    │   │  status         │   │  Cancelled      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire names are camelCase. Amounts travel as integer cents
//! (`priceCents`); documents from older clients that carry a decimal
//! `price` are converted by the menu repository before decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::UNKNOWN_GROUP_NAME;

// =============================================================================
// Rate
// =============================================================================

/// A rate in basis points (1 bps = 0.01%). 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Menu
// =============================================================================

/// Option group titles whose selection may stand in for the base price
/// (portion size, cup size, piece count).
pub const REPLACING_GROUP_TITLES: &[&str] = &["份量", "杯型", "数量", "size", "cup", "quantity"];

/// Type tags that mark a group as multi-select.
const MULTI_SELECT_TAGS: &[&str] = &["checkbox", "multi"];

/// A single selectable customization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    pub id: String,

    /// Display name. Cart lines reference options by this name.
    pub name: String,

    /// Price in cents. `None` means "no price data", not zero.
    #[serde(default)]
    pub price_cents: Option<i64>,

    #[serde(default)]
    pub is_default: bool,
}

impl MenuOption {
    #[inline]
    pub fn price(&self) -> Option<Money> {
        self.price_cents.map(Money::from_cents)
    }
}

/// A named set of customizations for a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    /// Free-form type tag. `checkbox`/`multi` are multi-select, anything else
    /// is single-select.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Semantic key of the group, e.g. "份量" or "辣度".
    pub title: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub options: Vec<MenuOption>,
}

impl OptionGroup {
    pub fn is_multi_select(&self) -> bool {
        MULTI_SELECT_TAGS
            .iter()
            .any(|tag| self.kind.eq_ignore_ascii_case(tag))
    }

    /// Whether the group title is one of [`REPLACING_GROUP_TITLES`].
    pub fn is_replacing(&self) -> bool {
        let title = self.title.trim();
        REPLACING_GROUP_TITLES
            .iter()
            .any(|candidate| title.eq_ignore_ascii_case(candidate))
    }

    /// True when every option in the group carries a price.
    ///
    /// Decides replace-vs-surcharge for replacing groups: if any sibling is
    /// unpriced, prices are surcharges on top of the base price.
    pub fn all_priced(&self) -> bool {
        self.options.iter().all(|opt| opt.price_cents.is_some())
    }

    pub fn option_by_id(&self, id: &str) -> Option<&MenuOption> {
        self.options.iter().find(|opt| opt.id == id)
    }

    pub fn option_by_name(&self, name: &str) -> Option<&MenuOption> {
        self.options.iter().find(|opt| opt.name == name)
    }

    /// The first option flagged `is_default`.
    pub fn default_option(&self) -> Option<&MenuOption> {
        self.options.iter().find(|opt| opt.is_default)
    }
}

/// An item on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Base price in cents.
    pub price_cents: i64,

    #[serde(default)]
    pub image_url: String,

    /// Category id.
    #[serde(default)]
    pub category: String,

    #[serde(default = "default_available")]
    pub available: bool,

    #[serde(default)]
    pub custom_options: Vec<OptionGroup>,
}

fn default_available() -> bool {
    true
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A menu category. `order` is the display position (ascending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub order: i64,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart, later copied by value into an [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// `{item_id}-{variant|default}-{unix_millis}`
    pub id: String,

    /// Menu item frozen at add time.
    pub menu_item: MenuItem,

    pub quantity: i64,

    /// Name of the chosen option in a replacing group, if any.
    #[serde(default)]
    pub variant: Option<String>,

    /// All selected options rendered as text, joined with `、`.
    #[serde(default)]
    pub special: Option<String>,

    /// Unit price computed by the option-selection flow.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl CartLine {
    /// Variant as a plain string ("" when absent).
    pub fn variant_str(&self) -> &str {
        self.variant.as_deref().unwrap_or("")
    }

    /// Special text as a plain string ("" when absent).
    pub fn special_str(&self) -> &str {
        self.special.as_deref().unwrap_or("")
    }

    /// Quantity with negative values treated as zero.
    #[inline]
    pub fn effective_quantity(&self) -> i64 {
        self.quantity.max(0)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Kitchen-facing order lifecycle.
///
/// ```text
/// Pending ──► Preparing ──► Ready ──► Completed
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Orders the kitchen still has to work on.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
        )
    }

    /// Whether staff may move an order from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. The item list is immutable after creation; only
/// `status` and `updated_at` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<CartLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    #[serde(default)]
    pub status: OrderStatus,

    /// `YYYYMMDD` + 3-digit same-day sequence.
    pub pickup_code: String,

    /// Customer-supplied group nickname. Older records may lack it.
    #[serde(default = "unknown_group_name")]
    pub group_name: String,

    #[serde(default)]
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn unknown_group_name() -> String {
    UNKNOWN_GROUP_NAME.to_string()
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(CartLine::effective_quantity).sum()
    }
}

// =============================================================================
// Restaurant Settings
// =============================================================================

/// Display information shown in the customer header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInfo {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub opening_hours: String,
}

/// Announcement banner content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub enabled: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
