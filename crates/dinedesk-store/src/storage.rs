//! # Storage Handle
//!
//! Builds the configured backend and hands out repositories.
//!
//! ## Backends by Mode
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoreConfig.mode                                                       │
//! │       │                                                                 │
//! │       ├── Local   ──► JsonFileStore(data_dir)                           │
//! │       ├── Remote  ──► MemoryStore("remote")                             │
//! │       └── Layered ──► LayeredStore<MemoryStore, JsonFileStore>          │
//! │                                                                         │
//! │  Storage                                                                │
//! │   ├── orders()   ──► OrderRepository                                    │
//! │   ├── menu()     ──► MenuRepository                                     │
//! │   └── settings() ──► SettingsRepository                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use dinedesk_store::{Storage, StoreConfig};
//!
//! let storage = Storage::open(StoreConfig::local("./data"))?;
//! let open = storage.orders().open_orders()?;
//! # Ok::<(), dinedesk_store::StoreError>(())
//! ```

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{StoreConfig, StoreMode};
use crate::document::{collections, DocumentStore};
use crate::error::StoreResult;
use crate::file::JsonFileStore;
use crate::layered::LayeredStore;
use crate::memory::MemoryStore;
use crate::migrate::{clear_collections, copy_collections};
use crate::repository::menu::MenuRepository;
use crate::repository::orders::OrderRepository;
use crate::repository::settings::{keys, SettingsRepository};

type Layered = LayeredStore<MemoryStore, JsonFileStore>;

/// Main storage handle providing repository access.
///
/// Cloning is cheap; every clone shares the same backend.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn DocumentStore>,
    layered: Option<Arc<Layered>>,
    config: StoreConfig,
}

impl Storage {
    /// Opens the backend selected by `config.mode`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        info!(mode = %config.mode, path = %config.data_dir.display(), "Opening storage");

        let storage = match config.mode {
            StoreMode::Local => {
                let store = Arc::new(JsonFileStore::open(&config.data_dir)?);
                Storage::with_store(store, config)
            }
            StoreMode::Remote => {
                let store = Arc::new(MemoryStore::named("remote"));
                Storage::with_store(store, config)
            }
            StoreMode::Layered => {
                let local = JsonFileStore::open(&config.data_dir)?;
                let layered = Arc::new(LayeredStore::new(MemoryStore::named("remote"), local));

                // The remote layer starts empty; seed it from the device cache
                // so orders placed before a restart stay visible.
                match layered.reconcile() {
                    Ok(_) => {}
                    Err(err) if err.is_unavailable() => {
                        warn!(error = %err, "Remote unavailable at open, serving local cache")
                    }
                    Err(err) => return Err(err),
                }

                Storage {
                    store: layered.clone(),
                    layered: Some(layered),
                    config,
                }
            }
        };

        Ok(storage)
    }

    /// Wraps an existing backend.
    pub fn with_store(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Storage {
            store,
            layered: None,
            config,
        }
    }

    /// A throwaway in-memory storage (for testing).
    pub fn in_memory() -> Self {
        let config = StoreConfig {
            mode: StoreMode::Remote,
            ..StoreConfig::default()
        };
        Storage::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The raw document store, for operations no repository covers.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.store.clone(), self.config.tombstone_limit)
    }

    pub fn menu(&self) -> MenuRepository {
        MenuRepository::new(self.store.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.store.clone())
    }

    /// Pushes writes made during a remote outage to the remote store.
    ///
    /// Only layered storage has anything to reconcile; other modes return 0.
    pub fn reconcile(&self) -> StoreResult<usize> {
        match &self.layered {
            Some(layered) => layered.reconcile(),
            None => Ok(0),
        }
    }

    /// Copies every collection into `target`, e.g. when a device moves
    /// from local-only to a remote store. Returns the number of documents.
    pub fn migrate_to(&self, target: &dyn DocumentStore) -> StoreResult<usize> {
        let copied = copy_collections(self.store.as_ref(), target, collections::ALL)?;
        info!(copied, "Migrated data to new store");
        Ok(copied)
    }

    /// Deletes every order, tombstone, menu item and setting.
    pub fn clear_all_data(&self) -> StoreResult<usize> {
        warn!("Clearing all stored data");
        clear_collections(self.store.as_ref(), collections::ALL)
    }

    /// Checks that the backend answers a read.
    pub fn health_check(&self) -> bool {
        self.store
            .get(collections::SETTINGS, keys::RESTAURANT_INFO)
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChangeKind;
    use chrono::{FixedOffset, TimeZone, Utc};
    use dinedesk_core::{CartLine, DiscountPolicy, MenuItem, NewOrder, OrderStatus};
    use std::time::Duration;

    fn line(name: &str, variant: Option<&str>, special: Option<&str>, qty: i64) -> CartLine {
        CartLine {
            id: format!("{name}-{}-0", variant.unwrap_or("default")),
            menu_item: MenuItem {
                id: name.into(),
                name: name.into(),
                description: String::new(),
                price_cents: 1500,
                image_url: String::new(),
                category: "1".into(),
                available: true,
                custom_options: vec![],
            },
            quantity: qty,
            variant: variant.map(Into::into),
            special: special.map(Into::into),
            unit_price_cents: None,
        }
    }

    fn checkout() -> NewOrder {
        NewOrder {
            group_name: "研发部".into(),
            notes: Some("少辣".into()),
        }
    }

    #[test]
    fn test_open_local_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::local(dir.path());

        let storage = Storage::open(config.clone()).unwrap();
        let now = Utc::now();
        let order = storage
            .orders()
            .create(vec![line("煎饺", None, None, 1)], &DiscountPolicy::none(), &checkout(), &now)
            .unwrap();
        assert!(storage.health_check());
        drop(storage);

        let reopened = Storage::open(config).unwrap();
        let stored = reopened.orders().get(&order.id).unwrap().unwrap();
        assert_eq!(stored.pickup_code, order.pickup_code);
        assert_eq!(stored.notes.as_deref(), Some("少辣"));
    }

    #[test]
    fn test_open_layered_keeps_orders_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            mode: StoreMode::Layered,
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };
        let now = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 18, 11, 0, 0)
            .unwrap();

        let storage = Storage::open(config.clone()).unwrap();
        let first = storage
            .orders()
            .create(vec![line("煎饺", None, None, 1)], &DiscountPolicy::none(), &checkout(), &now)
            .unwrap();
        drop(storage);

        let reopened = Storage::open(config).unwrap();
        assert_eq!(reopened.orders().list().unwrap().len(), 1);

        let second = reopened
            .orders()
            .create(vec![line("煎饺", None, None, 1)], &DiscountPolicy::none(), &checkout(), &now)
            .unwrap();
        assert_eq!(first.pickup_code, "20241218001");
        assert_eq!(second.pickup_code, "20241218002");
    }

    #[test]
    fn test_layered_outage_then_reconcile() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            mode: StoreMode::Layered,
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };
        let storage = Storage::open(config).unwrap();
        let layered = storage.layered.clone().unwrap();

        layered.remote().set_online(false);
        let order = storage
            .orders()
            .create(
                vec![line("煎饺", None, None, 2)],
                &DiscountPolicy::default(),
                &checkout(),
                &Utc::now(),
            )
            .unwrap();
        assert_eq!(storage.orders().list().unwrap().len(), 1);

        layered.remote().set_online(true);
        assert!(storage.orders().get(&order.id).unwrap().is_none());

        assert_eq!(storage.reconcile().unwrap(), 1);
        assert!(storage.orders().get(&order.id).unwrap().is_some());
    }

    #[test]
    fn test_kitchen_flow_feeds_prep_stats() {
        let storage = Storage::in_memory();
        let now = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 18, 12, 0, 0)
            .unwrap();
        let policy = DiscountPolicy::none();

        let first = storage
            .orders()
            .create(
                vec![line("黄焖鸡米饭", Some("大份"), Some("份量:大份、辣度:微辣"), 1)],
                &policy,
                &checkout(),
                &now,
            )
            .unwrap();
        let second = storage
            .orders()
            .create(
                vec![line("黄焖鸡米饭", Some("大份"), Some("份量:大份、辣度:中辣"), 2)],
                &policy,
                &checkout(),
                &now,
            )
            .unwrap();
        assert_eq!(second.pickup_code, "20241218002");

        storage
            .orders()
            .update_status(&first.id, OrderStatus::Cancelled, Utc::now())
            .unwrap();

        let open = storage.orders().open_orders().unwrap();
        let stats = dinedesk_core::aggregate_preparation_stats(&open);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_quantity, 2);
        assert_eq!(stats[0].options.get("辣度: 中辣"), Some(&2));
    }

    #[test]
    fn test_migrate_and_clear() {
        let source = Storage::in_memory();
        source.menu().add_category("主食").unwrap();
        let target = MemoryStore::new();

        assert_eq!(source.migrate_to(&target).unwrap(), 1);
        assert_eq!(source.clear_all_data().unwrap(), 1);
        assert!(source.menu().categories().unwrap().is_empty());

        let moved = Storage::with_store(Arc::new(target), StoreConfig::default());
        assert_eq!(moved.menu().categories().unwrap()[0].name, "主食");
    }

    #[tokio::test]
    async fn test_order_changes_reach_subscribers() {
        let storage = Storage::in_memory();
        let mut changes = storage.orders().subscribe();

        let order = storage
            .orders()
            .create(
                vec![line("煎饺", None, None, 1)],
                &DiscountPolicy::none(),
                &checkout(),
                &Utc::now(),
            )
            .unwrap();

        let change = tokio::time::timeout(Duration::from_secs(1), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.id, order.id);
        assert_eq!(change.kind, ChangeKind::Upserted);
    }
}
