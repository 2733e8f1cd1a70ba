//! # Order Repository
//!
//! Live orders live in `orders`; deleting one also writes a tombstone to
//! `deletedOrders` so that a stale cache or a second client cannot bring
//! it back.
//!
//! ## Delete Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete("o1")                                                           │
//! │    1. deletedOrders/o1 = { orderId: "o1", deletedAt: now }              │
//! │    2. orders/o1 removed                                                 │
//! │    3. oldest tombstones pruned beyond the configured limit              │
//! │                                                                         │
//! │  list() / get()                                                         │
//! │    orders ──► drop ids present in deletedOrders ──► decode ──► newest   │
//! │                                                            first        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use dinedesk_core::order::{place_order, transition};
use dinedesk_core::{CartLine, DiscountPolicy, NewOrder, Order, OrderStatus};

use crate::document::{collections, DocumentStore, DocumentStoreExt, Subscription};
use crate::error::{StoreError, StoreResult};
use crate::migrate::clear_collections;

/// Marker left behind by a deleted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tombstone {
    pub order_id: String,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
    tombstone_limit: usize,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>, tombstone_limit: usize) -> Self {
        OrderRepository {
            store,
            tombstone_limit,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live orders, newest first.
    ///
    /// Tombstoned ids are filtered out even if the order document is still
    /// around. Documents that do not decode are logged and skipped.
    pub fn list(&self) -> StoreResult<Vec<Order>> {
        let deleted = self.deleted_ids()?;

        let mut orders: Vec<Order> = self
            .store
            .scan(collections::ORDERS)?
            .into_iter()
            .filter(|(id, _)| !deleted.contains(id))
            .filter_map(|(id, mut doc)| {
                if let Some(obj) = doc.as_object_mut() {
                    obj.entry("id").or_insert_with(|| id.clone().into());
                }
                match serde_json::from_value::<Order>(doc) {
                    Ok(order) => Some(order),
                    Err(err) => {
                        warn!(id = %id, error = %err, "Skipping unreadable order");
                        None
                    }
                }
            })
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// One live order. Tombstoned orders read as `None`.
    pub fn get(&self, id: &str) -> StoreResult<Option<Order>> {
        if self.store.get(collections::DELETED_ORDERS, id)?.is_some() {
            return Ok(None);
        }
        self.store.get_as(collections::ORDERS, id)
    }

    /// Live orders a kitchen still has to work on.
    pub fn open_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|order| order.status.is_open())
            .collect())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Places an order from a cart snapshot and stores it.
    ///
    /// The pickup code is numbered against the live orders read just
    /// before the write.
    pub fn create<Tz: TimeZone>(
        &self,
        lines: Vec<CartLine>,
        policy: &DiscountPolicy,
        request: &NewOrder,
        now: &DateTime<Tz>,
    ) -> StoreResult<Order> {
        let existing = self.list()?;
        let order = place_order(lines, policy, request, &existing, now)?;

        self.store.set_as(collections::ORDERS, &order.id, &order)?;
        info!(
            id = %order.id,
            pickup_code = %order.pickup_code,
            total_cents = order.total_cents,
            "Order placed"
        );
        Ok(order)
    }

    /// Moves an order along its lifecycle and saves it.
    pub fn update_status(
        &self,
        id: &str,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut order = self
            .get(id)?
            .ok_or_else(|| StoreError::not_found(collections::ORDERS, id))?;

        let previous = order.status;
        transition(&mut order, next, now)?;

        if previous != order.status {
            self.store.set_as(collections::ORDERS, id, &order)?;
            info!(id = %id, from = %previous, to = %order.status, "Order status changed");
        }
        Ok(order)
    }

    /// Deletes an order and leaves a tombstone for it.
    pub fn delete(&self, id: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let tombstone = Tombstone {
            order_id: id.to_string(),
            deleted_at: now,
        };
        self.store
            .set_as(collections::DELETED_ORDERS, id, &tombstone)?;
        self.store.delete(collections::ORDERS, id)?;
        info!(id = %id, "Order deleted");

        self.prune_tombstones(self.tombstone_limit)?;
        Ok(())
    }

    // =========================================================================
    // Tombstones
    // =========================================================================

    /// All tombstones, newest first.
    pub fn tombstones(&self) -> StoreResult<Vec<Tombstone>> {
        let mut tombstones: Vec<Tombstone> = self
            .store
            .scan(collections::DELETED_ORDERS)?
            .into_iter()
            .filter_map(|(id, doc)| match serde_json::from_value(doc) {
                Ok(tombstone) => Some(tombstone),
                Err(err) => {
                    warn!(id = %id, error = %err, "Skipping unreadable tombstone");
                    None
                }
            })
            .collect();

        tombstones.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(tombstones)
    }

    /// Keeps the newest `limit` tombstones. Returns how many were removed.
    pub fn prune_tombstones(&self, limit: usize) -> StoreResult<usize> {
        let tombstones = self.tombstones()?;
        if tombstones.len() <= limit {
            return Ok(0);
        }

        let mut pruned = 0;
        for tombstone in &tombstones[limit..] {
            self.store
                .delete(collections::DELETED_ORDERS, &tombstone.order_id)?;
            pruned += 1;
        }

        debug!(pruned, limit, "Pruned order tombstones");
        Ok(pruned)
    }

    /// Removes every order and tombstone.
    pub fn clear_all(&self) -> StoreResult<usize> {
        clear_collections(
            self.store.as_ref(),
            &[collections::ORDERS, collections::DELETED_ORDERS],
        )
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(collections::ORDERS)
    }

    /// Ids with a tombstone document, whether or not it decodes.
    fn deleted_ids(&self) -> StoreResult<HashSet<String>> {
        Ok(self
            .store
            .scan(collections::DELETED_ORDERS)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }
}
