//! # Pricing Module
//!
//! Unit-price resolution for cart lines and for the option-selection flow.
//!
//! ## Two Paths to a Unit Price
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Option dialog ──► Selection ──► selection_unit_price() ──┐             │
//! │                                                            │ cached on  │
//! │                                                            ▼ the line   │
//! │  CartLine.unit_price_cents = Some(p) ──► resolve_unit_price() = p       │
//! │                                                                         │
//! │  CartLine.unit_price_cents = None (legacy lines)                        │
//! │      └──► match `variant` by option NAME across groups                  │
//! │             ├── replacing group, all priced  → price replaces base      │
//! │             ├── replacing group, some unpriced → base + price           │
//! │             ├── any other group               → base + price            │
//! │             └── no match                      → base                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Replace-vs-surcharge is inferred from sibling price data, never from an
//! explicit flag. Nothing here returns an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, MenuItem, MenuOption, OptionGroup};
use crate::SPECIAL_DELIMITER;

// =============================================================================
// Option Price Rule
// =============================================================================

/// How a chosen option affects the unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionEffect {
    /// The option price becomes the new base price.
    Replace(Money),
    /// The option price is added on top.
    Surcharge(Money),
    /// The option carries no price data.
    None,
}

fn option_effect(group: &OptionGroup, option: &MenuOption) -> OptionEffect {
    match option.price() {
        None => OptionEffect::None,
        Some(price) if group.is_replacing() && group.all_priced() => OptionEffect::Replace(price),
        Some(price) => OptionEffect::Surcharge(price),
    }
}

// =============================================================================
// Cart Line Resolution
// =============================================================================

/// Resolves the effective unit price of a cart line.
///
/// ## Rules
/// - A cached `unit_price_cents` wins unchanged.
/// - Otherwise the first priced option whose display name equals the line's
///   variant decides; unmatched variants fall back to the base price.
/// - The result is clamped to be non-negative.
///
/// ## Example
/// ```rust
/// use dinedesk_core::pricing::resolve_unit_price;
/// use dinedesk_core::types::{CartLine, MenuItem};
///
/// let item = MenuItem {
///     id: "1".into(),
///     name: "凉拌黄瓜".into(),
///     description: String::new(),
///     price_cents: 1200,
///     image_url: String::new(),
///     category: "3".into(),
///     available: true,
///     custom_options: vec![],
/// };
/// let line = CartLine {
///     id: "1-default-0".into(),
///     menu_item: item,
///     quantity: 1,
///     variant: None,
///     special: None,
///     unit_price_cents: None,
/// };
/// assert_eq!(resolve_unit_price(&line).cents(), 1200);
/// ```
pub fn resolve_unit_price(line: &CartLine) -> Money {
    if let Some(cached) = line.unit_price_cents {
        return Money::from_cents(cached).non_negative();
    }

    let item = &line.menu_item;
    let base = item.price();
    let variant = line.variant_str();
    if variant.is_empty() {
        return base.non_negative();
    }

    let matched = item.custom_options.iter().find_map(|group| {
        group
            .option_by_name(variant)
            .filter(|opt| opt.price_cents.is_some())
            .map(|opt| option_effect(group, opt))
    });

    let price = match matched {
        Some(OptionEffect::Replace(price)) => price,
        Some(OptionEffect::Surcharge(price)) => base + price,
        Some(OptionEffect::None) | None => {
            debug!(
                item_id = %item.id,
                variant = %variant,
                "No priced option matches variant, using base price"
            );
            base
        }
    };

    price.non_negative()
}

// =============================================================================
// Selection
// =============================================================================

/// The choice made in one option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum SelectedOption {
    /// Option id chosen in a single-select group.
    Single(String),
    /// Option ids ticked in a multi-select group.
    Multi(Vec<String>),
}

impl SelectedOption {
    fn is_empty(&self) -> bool {
        match self {
            SelectedOption::Single(id) => id.trim().is_empty(),
            SelectedOption::Multi(ids) => ids.is_empty(),
        }
    }
}

/// Selections keyed by option-group title.
pub type Selection = BTreeMap<String, SelectedOption>;

/// Builds the preselected state of the option dialog.
///
/// ## Rules
/// - The group's default option when one is flagged
/// - Otherwise the first option for single-select groups
/// - Otherwise nothing for multi-select groups
pub fn default_selection(item: &MenuItem) -> Selection {
    let mut selection = Selection::new();

    for group in &item.custom_options {
        let chosen = match (group.default_option(), group.is_multi_select()) {
            (Some(default), true) => SelectedOption::Multi(vec![default.id.clone()]),
            (Some(default), false) => SelectedOption::Single(default.id.clone()),
            (None, true) => SelectedOption::Multi(Vec::new()),
            (None, false) => match group.options.first() {
                Some(first) => SelectedOption::Single(first.id.clone()),
                None => continue,
            },
        };
        selection.insert(group.title.clone(), chosen);
    }

    selection
}

/// Checks that every required group has a selection.
///
/// ## Errors
/// `ValidationError::MissingSelections` naming every missing group, in menu
/// order.
pub fn validate_selection(item: &MenuItem, selection: &Selection) -> Result<(), ValidationError> {
    let missing: Vec<String> = item
        .custom_options
        .iter()
        .filter(|group| group.required)
        .filter(|group| {
            selection
                .get(&group.title)
                .map_or(true, SelectedOption::is_empty)
        })
        .map(|group| group.title.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingSelections { groups: missing })
    }
}

/// Unit price for an item customized through the option dialog.
///
/// A replacing selection substitutes the base price; every other priced
/// option is a surcharge. Surcharges from other groups are kept regardless
/// of group order.
pub fn selection_unit_price(item: &MenuItem, selection: &Selection) -> Money {
    let mut base = item.price();
    let mut surcharges = Money::zero();

    for group in &item.custom_options {
        match selection.get(&group.title) {
            Some(SelectedOption::Multi(ids)) => {
                surcharges += ids
                    .iter()
                    .filter_map(|id| group.option_by_id(id))
                    .filter_map(MenuOption::price)
                    .sum::<Money>();
            }
            Some(SelectedOption::Single(id)) => {
                let Some(option) = group.option_by_id(id) else {
                    continue;
                };
                match option_effect(group, option) {
                    OptionEffect::Replace(price) => base = price,
                    OptionEffect::Surcharge(price) => surcharges += price,
                    OptionEffect::None => {}
                }
            }
            None => {}
        }
    }

    (base + surcharges).non_negative()
}

/// Name of the option picked in the first replacing group (the "variant").
pub fn selected_variant(item: &MenuItem, selection: &Selection) -> Option<String> {
    item.custom_options
        .iter()
        .filter(|group| group.is_replacing())
        .find_map(|group| match selection.get(&group.title) {
            Some(SelectedOption::Single(id)) => group.option_by_id(id).map(|opt| opt.name.clone()),
            _ => None,
        })
}

/// Renders the selection as the line's special text.
///
/// Format: `"<title>: <name>"` per group in menu order; multi-select names
/// and groups are both joined with `、`. Unknown ids render verbatim.
///
/// ## Example
/// ```text
/// 份量: 大份、加料: 鸡蛋、香肠
/// ```
pub fn format_special(item: &MenuItem, selection: &Selection) -> String {
    let mut parts = Vec::new();

    for group in &item.custom_options {
        let name_of = |id: &String| {
            group
                .option_by_id(id)
                .map_or_else(|| id.clone(), |opt| opt.name.clone())
        };

        match selection.get(&group.title) {
            Some(SelectedOption::Multi(ids)) if !ids.is_empty() => {
                let names: Vec<String> = ids.iter().map(name_of).collect();
                parts.push(format!(
                    "{}: {}",
                    group.title,
                    names.join(SPECIAL_DELIMITER)
                ));
            }
            Some(SelectedOption::Single(id)) => {
                parts.push(format!("{}: {}", group.title, name_of(id)));
            }
            _ => {}
        }
    }

    parts.join(SPECIAL_DELIMITER)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, name: &str, price_cents: Option<i64>, is_default: bool) -> MenuOption {
        MenuOption {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            is_default,
        }
    }

    fn item(price_cents: i64, groups: Vec<OptionGroup>) -> MenuItem {
        MenuItem {
            id: "item-1".to_string(),
            name: "黄焖鸡米饭".to_string(),
            description: String::new(),
            price_cents,
            image_url: String::new(),
            category: "1".to_string(),
            available: true,
            custom_options: groups,
        }
    }

    fn size_group(options: Vec<MenuOption>) -> OptionGroup {
        OptionGroup {
            kind: "size".to_string(),
            title: "份量".to_string(),
            required: true,
            options,
        }
    }

    fn line(item: MenuItem, variant: Option<&str>, unit_price_cents: Option<i64>) -> CartLine {
        CartLine {
            id: "line-1".to_string(),
            menu_item: item,
            quantity: 1,
            variant: variant.map(str::to_string),
            special: None,
            unit_price_cents,
        }
    }

    fn surcharge_sized_item() -> MenuItem {
        item(
            1950,
            vec![size_group(vec![
                option("small", "小份", None, true),
                option("large", "大份", Some(600), false),
            ])],
        )
    }

    fn replace_sized_item() -> MenuItem {
        item(
            1000,
            vec![size_group(vec![
                option("s", "小杯", Some(200), true),
                option("l", "大杯", Some(400), false),
            ])],
        )
    }

    #[test]
    fn test_no_customization_is_base_price() {
        let l = line(surcharge_sized_item(), None, None);
        assert_eq!(resolve_unit_price(&l).cents(), 1950);
    }

    #[test]
    fn test_cached_price_wins() {
        let l = line(surcharge_sized_item(), Some("大份"), Some(2777));
        assert_eq!(resolve_unit_price(&l).cents(), 2777);
    }

    #[test]
    fn test_surcharge_mode_when_sibling_unpriced() {
        let unpriced = line(surcharge_sized_item(), Some("小份"), None);
        assert_eq!(resolve_unit_price(&unpriced).cents(), 1950);

        let priced = line(surcharge_sized_item(), Some("大份"), None);
        assert_eq!(resolve_unit_price(&priced).cents(), 1950 + 600);
    }

    #[test]
    fn test_replace_mode_when_all_priced() {
        let small = line(replace_sized_item(), Some("小杯"), None);
        assert_eq!(resolve_unit_price(&small).cents(), 200);

        let large = line(replace_sized_item(), Some("大杯"), None);
        assert_eq!(resolve_unit_price(&large).cents(), 400);
    }

    #[test]
    fn test_non_replacing_group_is_always_surcharge() {
        let spicy = OptionGroup {
            kind: "spicy".to_string(),
            title: "辣度".to_string(),
            required: false,
            options: vec![
                option("mild", "微辣", Some(0), true),
                option("hot", "特辣", Some(50), false),
            ],
        };
        let l = line(item(2600, vec![spicy]), Some("特辣"), None);
        assert_eq!(resolve_unit_price(&l).cents(), 2650);
    }

    #[test]
    fn test_unmatched_variant_falls_back_to_base() {
        let l = line(surcharge_sized_item(), Some("超大份"), None);
        assert_eq!(resolve_unit_price(&l).cents(), 1950);
    }

    #[test]
    fn test_unit_price_never_negative() {
        let odd = item(
            100,
            vec![OptionGroup {
                kind: "extra".to_string(),
                title: "优惠".to_string(),
                required: false,
                options: vec![option("coupon", "券", Some(-500), false)],
            }],
        );
        let l = line(odd, Some("券"), None);
        assert_eq!(resolve_unit_price(&l), Money::zero());

        let cached = line(surcharge_sized_item(), None, Some(-1));
        assert_eq!(resolve_unit_price(&cached), Money::zero());
    }

    #[test]
    fn test_default_selection() {
        let toppings = OptionGroup {
            kind: "checkbox".to_string(),
            title: "加料".to_string(),
            required: false,
            options: vec![option("egg", "鸡蛋", Some(100), false)],
        };
        let spicy = OptionGroup {
            kind: "spicy".to_string(),
            title: "辣度".to_string(),
            required: false,
            options: vec![option("mild", "微辣", None, false), option("hot", "重辣", None, false)],
        };
        let dish = item(
            1950,
            vec![
                size_group(vec![
                    option("small", "小份", None, false),
                    option("large", "大份", Some(600), true),
                ]),
                toppings,
                spicy,
            ],
        );

        let selection = default_selection(&dish);
        assert_eq!(
            selection.get("份量"),
            Some(&SelectedOption::Single("large".to_string()))
        );
        assert_eq!(selection.get("加料"), Some(&SelectedOption::Multi(vec![])));
        assert_eq!(
            selection.get("辣度"),
            Some(&SelectedOption::Single("mild".to_string()))
        );
    }

    #[test]
    fn test_validate_selection_names_missing_groups() {
        let toppings = OptionGroup {
            kind: "checkbox".to_string(),
            title: "加料".to_string(),
            required: true,
            options: vec![option("egg", "鸡蛋", Some(100), false)],
        };
        let dish = item(1950, vec![surcharge_sized_item().custom_options[0].clone(), toppings]);

        let err = validate_selection(&dish, &Selection::new()).unwrap_err();
        match err {
            ValidationError::MissingSelections { groups } => {
                assert_eq!(groups, vec!["份量".to_string(), "加料".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut selection = default_selection(&dish);
        assert!(validate_selection(&dish, &selection).is_err());
        selection.insert(
            "加料".to_string(),
            SelectedOption::Multi(vec!["egg".to_string()]),
        );
        assert!(validate_selection(&dish, &selection).is_ok());
    }

    #[test]
    fn test_selection_price_replace_keeps_other_surcharges() {
        let toppings = OptionGroup {
            kind: "checkbox".to_string(),
            title: "加料".to_string(),
            required: false,
            options: vec![
                option("egg", "鸡蛋", Some(100), false),
                option("ham", "火腿", Some(150), false),
            ],
        };
        // toppings listed before the size group on purpose
        let drink = item(
            1000,
            vec![toppings, replace_sized_item().custom_options[0].clone()],
        );

        let mut selection = Selection::new();
        selection.insert(
            "加料".to_string(),
            SelectedOption::Multi(vec!["egg".to_string(), "ham".to_string()]),
        );
        selection.insert("份量".to_string(), SelectedOption::Single("l".to_string()));

        assert_eq!(selection_unit_price(&drink, &selection).cents(), 400 + 250);
        assert_eq!(selected_variant(&drink, &selection).as_deref(), Some("大杯"));
        assert_eq!(format_special(&drink, &selection), "加料: 鸡蛋、火腿、份量: 大杯");
    }

    #[test]
    fn test_selection_price_surcharge_mode() {
        let dish = surcharge_sized_item();
        let mut selection = Selection::new();
        selection.insert("份量".to_string(), SelectedOption::Single("large".to_string()));
        assert_eq!(selection_unit_price(&dish, &selection).cents(), 2550);

        selection.insert("份量".to_string(), SelectedOption::Single("small".to_string()));
        assert_eq!(selection_unit_price(&dish, &selection).cents(), 1950);
    }

    #[test]
    fn test_format_special_unknown_id_rendered_verbatim() {
        let dish = surcharge_sized_item();
        let mut selection = Selection::new();
        selection.insert("份量".to_string(), SelectedOption::Single("jumbo".to_string()));
        assert_eq!(format_special(&dish, &selection), "份量: jumbo");
    }
}
