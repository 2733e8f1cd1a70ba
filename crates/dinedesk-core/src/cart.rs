//! # Cart
//!
//! The customer's cart and its derived totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI Action              Cart Method              Effect                 │
//! │  ─────────              ───────────              ──────                 │
//! │  Customize + add ─────► add_customized() ──────► validate, price, merge │
//! │  Quick add ───────────► add_item() ────────────► merge or push line     │
//! │  +/- buttons ─────────► update_quantity() ─────► qty ≤ 0 removes line   │
//! │  Remove ──────────────► remove_item()                                   │
//! │  Menu changed ────────► retain_on_menu() ──────► drop vanished dishes   │
//! │  Checkout ────────────► lines() copied by value into the Order          │
//! │                                                                         │
//! │  After every mutation: compute_cart_totals() runs from scratch.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::discount::{AppliedDiscount, DiscountPolicy};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{
    format_special, resolve_unit_price, selected_variant, selection_unit_price,
    validate_selection, Selection,
};
use crate::types::{CartLine, MenuItem};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Totals
// =============================================================================

/// Derived cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_item_count: i64,
    pub subtotal_cents: i64,
    pub discount: AppliedDiscount,
    pub total_cents: i64,
}

impl CartTotals {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Computes item count, subtotal, discount and total for a list of lines.
///
/// ## Rounding
/// Line amounts are summed exactly; the subtotal is rounded to €0.10
/// (half-up) once, and the total is rounded again after the discount.
/// Negative quantities count as zero.
///
/// ## Example
/// ```rust
/// use dinedesk_core::cart::compute_cart_totals;
/// use dinedesk_core::discount::DiscountPolicy;
///
/// let totals = compute_cart_totals(&[], &DiscountPolicy::default());
/// assert_eq!(totals.total_item_count, 0);
/// assert_eq!(totals.total_cents, 0);
/// ```
pub fn compute_cart_totals(lines: &[CartLine], policy: &DiscountPolicy) -> CartTotals {
    let total_item_count = lines.iter().map(CartLine::effective_quantity).sum();

    let subtotal = lines
        .iter()
        .map(|line| resolve_unit_price(line).multiply_quantity(line.effective_quantity()))
        .sum::<Money>()
        .round_to_tenth();

    let discount = policy.evaluate(subtotal);
    let total = (subtotal - discount.savings()).round_to_tenth();

    CartTotals {
        total_item_count,
        subtotal_cents: subtotal.cents(),
        discount,
        total_cents: total.cents(),
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Line attributes beyond the menu item and quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineOptions {
    pub variant: Option<String>,
    pub special: Option<String>,
    pub unit_price: Option<Money>,
}

/// The shopping cart. Exclusively owns its lines.
///
/// ## Invariants
/// - Lines are unique by (menu item id, variant, special)
/// - Every line has quantity ≥ 1; reaching 0 removes the line
/// - At most `MAX_CART_LINES` lines, `MAX_LINE_QUANTITY` per line
///
/// Serialized as a bare array of lines (the `cartItems` setting).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Restores a cart from persisted lines.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart { lines };
        cart.lines.retain(|line| line.quantity > 0);
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Copies the lines out for an order snapshot.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Adds a menu item, merging with a matching line.
    ///
    /// ## Behavior
    /// - Matching line (same item id, variant, special): quantity changes by
    ///   `quantity`, which may be negative; a result ≤ 0 removes the line
    /// - No match and `quantity > 0`: appends a new line
    /// - No match and `quantity ≤ 0`: no-op
    pub fn add_item(
        &mut self,
        item: &MenuItem,
        quantity: i64,
        options: LineOptions,
    ) -> CoreResult<()> {
        self.add_item_at(item, quantity, options, Utc::now())
    }

    /// [`Cart::add_item`] with an explicit clock, used for the line id.
    pub fn add_item_at(
        &mut self,
        item: &MenuItem,
        quantity: i64,
        options: LineOptions,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let variant = non_empty(options.variant);
        let special = non_empty(options.special);

        if let Some(index) = self.lines.iter().position(|line| {
            line.menu_item.id == item.id && line.variant == variant && line.special == special
        }) {
            let new_qty = self.lines[index].quantity + quantity;
            if new_qty <= 0 {
                self.lines.remove(index);
                return Ok(());
            }
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            self.lines[index].quantity = new_qty;
            return Ok(());
        }

        if quantity <= 0 {
            return Ok(());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let id = format!(
            "{}-{}-{}",
            item.id,
            variant.as_deref().unwrap_or("default"),
            now.timestamp_millis()
        );
        self.lines.push(CartLine {
            id,
            menu_item: item.clone(),
            quantity,
            variant,
            special,
            unit_price_cents: options.unit_price.map(|p| p.cents()),
        });
        Ok(())
    }

    /// Adds an item customized through the option dialog.
    ///
    /// Validates required groups, then caches the computed unit price on
    /// the line together with the variant and special text.
    pub fn add_customized(
        &mut self,
        item: &MenuItem,
        quantity: i64,
        selection: &Selection,
    ) -> CoreResult<()> {
        validate_selection(item, selection)?;

        let options = LineOptions {
            variant: selected_variant(item, selection),
            special: Some(format_special(item, selection)),
            unit_price: Some(selection_unit_price(item, selection)),
        };
        self.add_item(item, quantity, options)
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(line_id);
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|line| line.id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotFound(line_id.to_string())),
        }
    }

    /// Removes a line by id.
    pub fn remove_item(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|line| line.id != line_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Drops lines whose menu item is no longer on the menu.
    ///
    /// Returns the number of lines removed.
    pub fn retain_on_menu<'a>(&mut self, menu: impl IntoIterator<Item = &'a MenuItem>) -> usize {
        let ids: HashSet<&str> = menu.into_iter().map(|item| item.id.as_str()).collect();
        let initial_len = self.lines.len();
        self.lines
            .retain(|line| ids.contains(line.menu_item.id.as_str()));
        initial_len - self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Totals under the given discount policy.
    pub fn totals(&self, policy: &DiscountPolicy) -> CartTotals {
        compute_cart_totals(&self.lines, policy)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::SelectedOption;
    use crate::types::{MenuOption, OptionGroup};
    use chrono::TimeZone;

    fn dish(id: &str, price_cents: i64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: format!("Dish {}", id),
            description: String::new(),
            price_cents,
            image_url: String::new(),
            category: "1".to_string(),
            available: true,
            custom_options: vec![],
        }
    }

    fn sized_dish() -> MenuItem {
        let mut item = dish("sized", 1950);
        item.custom_options.push(OptionGroup {
            kind: "size".to_string(),
            title: "份量".to_string(),
            required: true,
            options: vec![
                MenuOption {
                    id: "small".to_string(),
                    name: "小份".to_string(),
                    price_cents: None,
                    is_default: true,
                },
                MenuOption {
                    id: "large".to_string(),
                    name: "大份".to_string(),
                    price_cents: Some(600),
                    is_default: false,
                },
            ],
        });
        item
    }

    fn line(price_cents: i64, quantity: i64) -> CartLine {
        CartLine {
            id: format!("line-{}", price_cents),
            menu_item: dish("x", price_cents),
            quantity,
            variant: None,
            special: None,
            unit_price_cents: None,
        }
    }

    #[test]
    fn test_totals_below_discount_threshold() {
        let totals = compute_cart_totals(&[line(9990, 1)], &DiscountPolicy::default());
        assert_eq!(totals.subtotal_cents, 9990);
        assert!(totals.discount.is_none());
        assert_eq!(totals.total_cents, totals.subtotal_cents);
    }

    #[test]
    fn test_totals_ten_percent_tier() {
        let totals = compute_cart_totals(&[line(5000, 3)], &DiscountPolicy::default());
        assert_eq!(totals.total_item_count, 3);
        assert_eq!(totals.subtotal_cents, 15000);
        assert_eq!(totals.discount.savings_cents, 1500);
        assert_eq!(totals.total_cents, 13500);
    }

    #[test]
    fn test_totals_over_200_still_uses_first_tier() {
        let totals = compute_cart_totals(&[line(12500, 2)], &DiscountPolicy::default());
        assert_eq!(totals.subtotal_cents, 25000);
        assert_eq!(totals.discount.savings_cents, 2500);
        assert_eq!(totals.total_cents, 22500);
    }

    #[test]
    fn test_flat_discount_never_drives_total_negative() {
        let policy = DiscountPolicy {
            tiers: vec![crate::discount::DiscountTier::flat(
                "€30 off",
                Money::zero(),
                Money::from_cents(3000),
            )],
        };
        let totals = compute_cart_totals(&[line(1200, 1)], &policy);
        assert_eq!(totals.discount.savings_cents, 1200);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_subtotal_rounded_once_at_the_end() {
        // 3 × €0.33 = €0.99 → €1.00; per-line rounding would give €0.90
        let lines = vec![line(33, 1), line(33, 1), line(33, 1)];
        let totals = compute_cart_totals(&lines, &DiscountPolicy::none());
        assert_eq!(totals.subtotal_cents, 100);
    }

    #[test]
    fn test_totals_idempotent() {
        let lines = vec![line(1950, 2), line(1200, 5)];
        let policy = DiscountPolicy::default();
        assert_eq!(
            compute_cart_totals(&lines, &policy),
            compute_cart_totals(&lines, &policy)
        );
    }

    #[test]
    fn test_negative_quantity_counts_as_zero() {
        let totals = compute_cart_totals(&[line(1000, -3), line(500, 1)], &DiscountPolicy::none());
        assert_eq!(totals.total_item_count, 1);
        assert_eq!(totals.subtotal_cents, 500);
    }

    #[test]
    fn test_add_merges_matching_lines() {
        let mut cart = Cart::new();
        let item = dish("1", 999);

        cart.add_item(&item, 2, LineOptions::default()).unwrap();
        cart.add_item(&item, 3, LineOptions::default()).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_distinct_variants_are_separate_lines() {
        let mut cart = Cart::new();
        let item = sized_dish();
        let small = LineOptions {
            variant: Some("小份".to_string()),
            ..LineOptions::default()
        };
        let large = LineOptions {
            variant: Some("大份".to_string()),
            ..LineOptions::default()
        };

        cart.add_item(&item, 1, small).unwrap();
        cart.add_item(&item, 1, large).unwrap();
        assert_eq!(cart.line_count(), 2);

        let totals = cart.totals(&DiscountPolicy::none());
        assert_eq!(totals.subtotal_cents, 1950 + 2550);
    }

    #[test]
    fn test_negative_delta_removes_line() {
        let mut cart = Cart::new();
        let item = dish("1", 999);

        cart.add_item(&item, 2, LineOptions::default()).unwrap();
        cart.add_item(&item, -2, LineOptions::default()).unwrap();
        assert!(cart.is_empty());

        cart.add_item(&item, -1, LineOptions::default()).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_line_id_format() {
        let mut cart = Cart::new();
        let now = Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap();
        cart.add_item_at(&dish("7", 100), 1, LineOptions::default(), now)
            .unwrap();
        assert_eq!(
            cart.lines()[0].id,
            format!("7-default-{}", now.timestamp_millis())
        );
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&dish("1", 999), 2, LineOptions::default())
            .unwrap();
        let id = cart.lines()[0].id.clone();

        cart.update_quantity(&id, 4).unwrap();
        assert_eq!(cart.lines()[0].quantity, 4);

        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            cart.update_quantity(&id, 1),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        let result = cart.add_item(&dish("1", 100), MAX_LINE_QUANTITY + 1, LineOptions::default());
        assert!(matches!(result, Err(CoreError::QuantityTooLarge { .. })));
    }

    #[test]
    fn test_add_customized_caches_price_and_text() {
        let mut cart = Cart::new();
        let item = sized_dish();
        let mut selection = Selection::new();
        selection.insert("份量".to_string(), SelectedOption::Single("large".to_string()));

        cart.add_customized(&item, 2, &selection).unwrap();

        let line = &cart.lines()[0];
        assert_eq!(line.unit_price_cents, Some(2550));
        assert_eq!(line.variant.as_deref(), Some("大份"));
        assert_eq!(line.special.as_deref(), Some("份量: 大份"));
        assert_eq!(cart.totals(&DiscountPolicy::none()).subtotal_cents, 5100);
    }

    #[test]
    fn test_add_customized_rejects_missing_required() {
        let mut cart = Cart::new();
        let err = cart
            .add_customized(&sized_dish(), 1, &Selection::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_retain_on_menu() {
        let mut cart = Cart::new();
        let kept = dish("1", 100);
        let gone = dish("2", 200);
        cart.add_item(&kept, 1, LineOptions::default()).unwrap();
        cart.add_item(&gone, 1, LineOptions::default()).unwrap();

        let removed = cart.retain_on_menu([&kept]);
        assert_eq!(removed, 1);
        assert_eq!(cart.lines()[0].menu_item.id, "1");
    }

    #[test]
    fn test_cart_serializes_as_line_array() {
        let mut cart = Cart::new();
        cart.add_item(&dish("1", 100), 1, LineOptions::default())
            .unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["menuItem"]["id"], "1");
    }
}
