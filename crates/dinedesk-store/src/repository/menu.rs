//! # Menu Repository
//!
//! Menu items (the `menuItems` collection) and the category list (stored
//! as the `categories` setting).
//!
//! ## Category Reordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  move_category("饮品", Up)                                              │
//! │                                                                         │
//! │   before               after                                            │
//! │   主食  order 1        主食  order 1                                    │
//! │   小吃  order 2   ┐    饮品  order 2                                    │
//! │   饮品  order 3   ┘    小吃  order 3     (orders swapped pairwise)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use dinedesk_core::validation::{validate_menu_item, validate_name};
use dinedesk_core::{Category, MenuItem};

use crate::document::{collections, Document, DocumentStore, DocumentStoreExt, Subscription};
use crate::error::{StoreError, StoreResult};
use crate::repository::settings::SettingsRepository;

/// Direction for [`MenuRepository::move_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Clone)]
pub struct MenuRepository {
    store: Arc<dyn DocumentStore>,
    settings: SettingsRepository,
}

impl MenuRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        MenuRepository {
            settings: SettingsRepository::new(store.clone()),
            store,
        }
    }

    // =========================================================================
    // Menu Items
    // =========================================================================

    /// All menu items. Documents that no longer decode are skipped.
    pub fn list_items(&self) -> StoreResult<Vec<MenuItem>> {
        let items = self
            .store
            .scan(collections::MENU_ITEMS)?
            .into_iter()
            .filter_map(|(id, mut doc)| {
                normalize_item(&id, &mut doc);
                match serde_json::from_value::<MenuItem>(doc) {
                    Ok(item) => Some(item),
                    Err(err) => {
                        warn!(id = %id, error = %err, "Skipping unreadable menu item");
                        None
                    }
                }
            })
            .collect();
        Ok(items)
    }

    /// Items of one category that are currently available.
    pub fn available_in(&self, category_id: &str) -> StoreResult<Vec<MenuItem>> {
        Ok(self
            .list_items()?
            .into_iter()
            .filter(|item| item.available && item.category == category_id)
            .collect())
    }

    pub fn get_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        let Some(mut doc) = self.store.get(collections::MENU_ITEMS, id)? else {
            return Ok(None);
        };
        normalize_item(id, &mut doc);
        Ok(Some(serde_json::from_value(doc)?))
    }

    /// Validates and stores a new item. An empty id is replaced with a
    /// generated one.
    pub fn create_item(&self, mut item: MenuItem) -> StoreResult<MenuItem> {
        validate_menu_item(&item)?;
        if item.id.trim().is_empty() {
            item.id = Uuid::new_v4().to_string();
        }

        self.store.set_as(collections::MENU_ITEMS, &item.id, &item)?;
        info!(id = %item.id, name = %item.name, "Menu item created");
        Ok(item)
    }

    /// Replaces an existing item.
    pub fn update_item(&self, item: &MenuItem) -> StoreResult<()> {
        validate_menu_item(item)?;
        if self.store.get(collections::MENU_ITEMS, &item.id)?.is_none() {
            return Err(StoreError::not_found(collections::MENU_ITEMS, &item.id));
        }
        self.store.set_as(collections::MENU_ITEMS, &item.id, item)
    }

    pub fn set_availability(&self, id: &str, available: bool) -> StoreResult<MenuItem> {
        let mut item = self
            .get_item(id)?
            .ok_or_else(|| StoreError::not_found(collections::MENU_ITEMS, id))?;
        item.available = available;
        self.store.set_as(collections::MENU_ITEMS, id, &item)?;
        Ok(item)
    }

    pub fn delete_item(&self, id: &str) -> StoreResult<()> {
        self.store.delete(collections::MENU_ITEMS, id)?;
        info!(id = %id, "Menu item deleted");
        Ok(())
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(collections::MENU_ITEMS)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub fn categories(&self) -> StoreResult<Vec<Category>> {
        self.settings.categories()
    }

    /// Appends a category after the last one.
    pub fn add_category(&self, name: &str) -> StoreResult<Category> {
        validate_name("category name", name)?;

        let mut categories = self.categories()?;
        let order = categories.iter().map(|c| c.order).max().unwrap_or(0) + 1;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            order,
        };

        categories.push(category.clone());
        self.settings.set_categories(&categories)?;
        Ok(category)
    }

    pub fn rename_category(&self, id: &str, name: &str) -> StoreResult<()> {
        validate_name("category name", name)?;

        let mut categories = self.categories()?;
        let category = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("category", id))?;
        category.name = name.trim().to_string();
        self.settings.set_categories(&categories)
    }

    /// Removes a category. Items in it are kept and keep their category id.
    pub fn delete_category(&self, id: &str) -> StoreResult<()> {
        let mut categories = self.categories()?;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(StoreError::not_found("category", id));
        }
        self.settings.set_categories(&categories)
    }

    /// Swaps a category's sort order with its neighbour.
    ///
    /// Returns `false` when the category is already first (Up) or last
    /// (Down) and nothing changed.
    pub fn move_category(&self, id: &str, direction: MoveDirection) -> StoreResult<bool> {
        let mut categories = self.categories()?;
        let index = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("category", id))?;

        let neighbour = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < categories.len() => index + 1,
            _ => return Ok(false),
        };

        let order = categories[index].order;
        categories[index].order = categories[neighbour].order;
        categories[neighbour].order = order;
        categories.sort_by_key(|c| c.order);

        self.settings.set_categories(&categories)?;
        Ok(true)
    }
}

// =============================================================================
// Legacy Documents
// =============================================================================

/// Fills in the document id and converts decimal `price` fields written by
/// older clients to `priceCents`, on the item and on every option.
fn normalize_item(id: &str, doc: &mut Document) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    obj.entry("id").or_insert_with(|| id.into());
    upgrade_price(obj);

    let groups = obj
        .get_mut("customOptions")
        .and_then(Document::as_array_mut);
    for group in groups.into_iter().flatten() {
        let options = group
            .get_mut("options")
            .and_then(Document::as_array_mut);
        for option in options.into_iter().flatten() {
            if let Some(option) = option.as_object_mut() {
                upgrade_price(option);
            }
        }
    }
}

fn upgrade_price(obj: &mut serde_json::Map<String, Document>) {
    if obj.contains_key("priceCents") {
        return;
    }
    if let Some(price) = obj.get("price").and_then(Document::as_f64) {
        let cents = (price * 100.0).round() as i64;
        obj.insert("priceCents".to_string(), cents.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use dinedesk_core::{CoreError, MenuOption, OptionGroup};
    use serde_json::json;

    fn repo() -> (Arc<MemoryStore>, MenuRepository) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), MenuRepository::new(store))
    }

    fn dumplings() -> MenuItem {
        MenuItem {
            id: String::new(),
            name: "煎饺".into(),
            description: "外酥里嫩".into(),
            price_cents: 1500,
            image_url: String::new(),
            category: "3".into(),
            available: true,
            custom_options: vec![OptionGroup {
                kind: "radio".into(),
                title: "份量".into(),
                required: true,
                options: vec![MenuOption {
                    id: "small".into(),
                    name: "小份(8个)".into(),
                    price_cents: None,
                    is_default: true,
                }],
            }],
        }
    }

    #[test]
    fn test_item_crud() {
        let (_, menu) = repo();
        let item = menu.create_item(dumplings()).unwrap();
        assert!(!item.id.is_empty());
        assert_eq!(menu.get_item(&item.id).unwrap(), Some(item.clone()));

        let hidden = menu.set_availability(&item.id, false).unwrap();
        assert!(!hidden.available);
        assert!(menu.available_in("3").unwrap().is_empty());

        menu.delete_item(&item.id).unwrap();
        assert!(menu.list_items().unwrap().is_empty());
        assert!(matches!(
            menu.update_item(&item),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_item_rejected() {
        let (_, menu) = repo();
        let mut item = dumplings();
        item.price_cents = -100;
        assert!(matches!(
            menu.create_item(item),
            Err(StoreError::Core(CoreError::Validation(_)))
        ));
    }

    #[test]
    fn test_list_tolerates_drift() {
        let (store, menu) = repo();
        store
            .set(
                collections::MENU_ITEMS,
                "legacy",
                json!({"name": "凉拌黄瓜", "priceCents": 1200, "category": "3"}),
            )
            .unwrap();
        store
            .set(collections::MENU_ITEMS, "broken", json!({"name": 42}))
            .unwrap();

        let items = menu.list_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "legacy");
        assert!(items[0].available);
    }

    #[test]
    fn test_legacy_decimal_prices_are_converted() {
        let (store, menu) = repo();
        store
            .set(
                collections::MENU_ITEMS,
                "old",
                json!({
                    "name": "黄焖鸡米饭",
                    "price": 19.5,
                    "category": "1",
                    "customOptions": [{
                        "type": "radio",
                        "title": "份量",
                        "options": [
                            {"id": "regular", "name": "标准"},
                            {"id": "large", "name": "大份", "price": 6.0}
                        ]
                    }]
                }),
            )
            .unwrap();

        let items = menu.list_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_cents, 1950);
        let options = &items[0].custom_options[0].options;
        assert_eq!(options[0].price_cents, None);
        assert_eq!(options[1].price_cents, Some(600));

        let item = menu.get_item("old").unwrap().unwrap();
        assert_eq!(item.id, "old");
        assert_eq!(item.price_cents, 1950);
    }

    #[test]
    fn test_move_category() {
        let (_, menu) = repo();
        let staple = menu.add_category("主食").unwrap();
        let snack = menu.add_category("小吃").unwrap();
        let drink = menu.add_category("饮品").unwrap();

        assert!(menu.move_category(&drink.id, MoveDirection::Up).unwrap());
        let names: Vec<_> = menu.categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["主食", "饮品", "小吃"]);

        assert!(!menu.move_category(&staple.id, MoveDirection::Up).unwrap());
        assert!(!menu.move_category(&snack.id, MoveDirection::Down).unwrap());

        menu.rename_category(&snack.id, "凉菜").unwrap();
        menu.delete_category(&staple.id).unwrap();
        let names: Vec<_> = menu.categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["饮品", "凉菜"]);
    }
}
