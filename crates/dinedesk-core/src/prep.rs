//! # Kitchen Preparation Stats
//!
//! Read-only aggregation of what the kitchen still has to cook.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open orders (pending / preparing / ready)                              │
//! │        │  every line                                                    │
//! │        ▼                                                                │
//! │  key = name[_variant][_special]        display = name[ (variant)]       │
//! │        │                                          [ - special]          │
//! │        ▼                                                                │
//! │  DishStats { total_quantity += qty }                                    │
//! │        │  special split on '、'                                         │
//! │        ▼                                                                │
//! │  "选择日期: Mon、Tue" ──► "选择日期: Mon" += qty, "选择日期: Tue" += qty │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A token without a `title:` part inherits the title of the closest token
//! before it that had one. Tokens that match no pattern are counted as-is.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::types::{CartLine, Order};
use crate::SPECIAL_DELIMITER;

/// One dish (name + variant + special text) the kitchen has to prepare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DishStats {
    pub key: String,
    pub display_name: String,
    pub base_item_name: String,
    pub variant: String,
    pub special: String,
    pub total_quantity: i64,
    /// Sub-option token → quantity.
    pub options: BTreeMap<String, i64>,
}

/// Header figures for the preparation board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrepSummary {
    pub dish_kinds: usize,
    pub total_dishes: i64,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates every line of the open orders into per-dish counts.
///
/// Orders that are completed or cancelled are skipped, so passing the full
/// order collection is fine. Output is sorted by total quantity, highest
/// first; dishes with equal totals keep the order they were first seen in.
pub fn aggregate_preparation_stats(orders: &[Order]) -> Vec<DishStats> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<DishStats> = Vec::new();

    for line in orders
        .iter()
        .filter(|order| order.status.is_open())
        .flat_map(|order| order.items.iter())
    {
        let key = dish_key(line);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            stats.push(DishStats {
                display_name: display_name(line),
                base_item_name: line.menu_item.name.clone(),
                variant: line.variant_str().to_string(),
                special: line.special_str().to_string(),
                total_quantity: 0,
                options: BTreeMap::new(),
                key,
            });
            stats.len() - 1
        });

        let dish = &mut stats[slot];
        dish.total_quantity += line.quantity;
        for token in split_sub_options(line.special_str()) {
            *dish.options.entry(token).or_insert(0) += line.quantity;
        }
    }

    // sort_by is stable
    stats.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    stats
}

/// Dish count and total quantity across aggregated stats.
pub fn summarize(stats: &[DishStats]) -> PrepSummary {
    PrepSummary {
        dish_kinds: stats.len(),
        total_dishes: stats.iter().map(|s| s.total_quantity).sum(),
    }
}

/// `name[_variant][_special]`, shared with the sales report.
pub(crate) fn dish_key(line: &CartLine) -> String {
    let mut key = line.menu_item.name.clone();
    for part in [line.variant_str(), line.special_str()] {
        if !part.trim().is_empty() {
            key.push('_');
            key.push_str(part);
        }
    }
    key
}

pub(crate) fn display_name(line: &CartLine) -> String {
    let mut name = line.menu_item.name.clone();
    let variant = line.variant_str();
    if !variant.trim().is_empty() {
        name.push_str(&format!(" ({variant})"));
    }
    let special = line.special_str();
    if !special.trim().is_empty() {
        name.push_str(&format!(" - {special}"));
    }
    name
}

// =============================================================================
// Special Text Tokens
// =============================================================================

/// Splits special text into countable `title: value` tokens.
pub fn split_sub_options(special: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut title: Option<&str> = None;

    for raw in special.split(SPECIAL_DELIMITER) {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once(':') {
            Some((head, value)) => {
                let head = head.trim();
                title = Some(head);
                tokens.push(format!("{}: {}", head, value.trim()));
            }
            None => match title {
                Some(head) => tokens.push(format!("{head}: {token}")),
                None => tokens.push(token.to_string()),
            },
        }
    }

    tokens
}

// =============================================================================
// Unit Tests
// =============================================================================
