//! # Settings Repository
//!
//! The `settings` collection: one document per key, shaped as
//! `{ "value": …, "updatedAt": … }`.
//!
//! | Key              | Value                         |
//! |------------------|-------------------------------|
//! | `categories`     | `Vec<Category>`               |
//! | `restaurantInfo` | `RestaurantInfo`              |
//! | `announcement`   | `Announcement`                |
//! | `discountTiers`  | `DiscountPolicy`              |
//! | `cartItems`      | `Cart` (a bare array of lines)|

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use dinedesk_core::{Announcement, Cart, Category, DiscountPolicy, RestaurantInfo};

use crate::document::{collections, DocumentStore, Subscription};
use crate::error::StoreResult;

/// Setting keys.
pub mod keys {
    pub const CATEGORIES: &str = "categories";
    pub const RESTAURANT_INFO: &str = "restaurantInfo";
    pub const ANNOUNCEMENT: &str = "announcement";
    pub const DISCOUNT_TIERS: &str = "discountTiers";
    pub const CART_ITEMS: &str = "cartItems";
}

#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn DocumentStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SettingsRepository { store }
    }

    // =========================================================================
    // Generic Access
    // =========================================================================

    /// Reads a setting. Missing keys and documents without a `value` are `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(mut doc) = self.store.get(collections::SETTINGS, key)? else {
            return Ok(None);
        };

        match doc.get_mut("value").map(serde_json::Value::take) {
            Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value)?)),
            _ => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        debug!(key, "Saving setting");
        let doc = json!({
            "value": serde_json::to_value(value)?,
            "updatedAt": Utc::now().to_rfc3339(),
        });
        self.store.set(collections::SETTINGS, key, doc)
    }

    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.store.delete(collections::SETTINGS, key)
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(collections::SETTINGS)
    }

    // =========================================================================
    // Typed Keys
    // =========================================================================

    /// Categories sorted by their `order` field.
    pub fn categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.get(keys::CATEGORIES)?.unwrap_or_default();
        categories.sort_by_key(|c| c.order);
        Ok(categories)
    }

    pub fn set_categories(&self, categories: &[Category]) -> StoreResult<()> {
        self.set(keys::CATEGORIES, &categories)
    }

    pub fn restaurant_info(&self) -> StoreResult<RestaurantInfo> {
        Ok(self.get(keys::RESTAURANT_INFO)?.unwrap_or_default())
    }

    pub fn set_restaurant_info(&self, info: &RestaurantInfo) -> StoreResult<()> {
        self.set(keys::RESTAURANT_INFO, info)
    }

    pub fn announcement(&self) -> StoreResult<Announcement> {
        Ok(self.get(keys::ANNOUNCEMENT)?.unwrap_or_default())
    }

    pub fn set_announcement(&self, announcement: &Announcement) -> StoreResult<()> {
        self.set(keys::ANNOUNCEMENT, announcement)
    }

    /// The configured discount tiers, or the default policy if none is
    /// stored or the stored one cannot be read or has invalid tiers.
    pub fn discount_policy(&self) -> StoreResult<DiscountPolicy> {
        match self.get::<DiscountPolicy>(keys::DISCOUNT_TIERS) {
            Ok(Some(policy)) => match policy.validate() {
                Ok(()) => Ok(policy),
                Err(err) => {
                    warn!(error = %err, "Invalid discount tiers, using defaults");
                    Ok(DiscountPolicy::default())
                }
            },
            Ok(None) => Ok(DiscountPolicy::default()),
            Err(err) if err.is_unavailable() => Err(err),
            Err(err) => {
                warn!(error = %err, "Unreadable discount tiers, using defaults");
                Ok(DiscountPolicy::default())
            }
        }
    }

    pub fn set_discount_policy(&self, policy: &DiscountPolicy) -> StoreResult<()> {
        policy.validate()?;
        self.set(keys::DISCOUNT_TIERS, policy)
    }

    /// The persisted cart, empty if none.
    pub fn cart(&self) -> StoreResult<Cart> {
        Ok(self.get(keys::CART_ITEMS)?.unwrap_or_default())
    }

    pub fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.set(keys::CART_ITEMS, cart)
    }

    pub fn clear_cart(&self) -> StoreResult<()> {
        self.delete(keys::CART_ITEMS)
    }
}
