//! # Document Store Port
//!
//! The capability every backend provides: keyed documents grouped into
//! collections, a full collection scan and change notifications.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  collection "orders"                                                    │
//! │   ├── "9b1c…" → { "id": "9b1c…", "pickupCode": "20241215001", … }       │
//! │   └── "e07a…" → { … }                                                   │
//! │                                                                         │
//! │  get / set / delete ──► one document                                    │
//! │  scan              ──► every (id, document) of a collection             │
//! │  subscribe         ──► Subscription, dropped = unsubscribed             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications carry only the changed id. Subscribers re-read the
//! collection and recompute whatever they derive from it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::StoreResult;

/// A stored document.
pub type Document = serde_json::Value;

/// Collection names shared by every client.
pub mod collections {
    pub const ORDERS: &str = "orders";
    pub const MENU_ITEMS: &str = "menuItems";
    pub const SETTINGS: &str = "settings";
    pub const DELETED_ORDERS: &str = "deletedOrders";

    /// Every collection, for bulk copy and wipe.
    pub const ALL: &[&str] = &[ORDERS, MENU_ITEMS, SETTINGS, DELETED_ORDERS];
}

// =============================================================================
// Port
// =============================================================================

/// Storage capability used by the repositories.
///
/// Implementations must be cheap to call from any thread; none of the
/// methods block on the network.
pub trait DocumentStore: Send + Sync {
    /// Fetches one document.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Creates or replaces one document.
    fn set(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()>;

    /// Removes one document. Removing a missing id is not an error.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Every document in a collection, ordered by id.
    fn scan(&self, collection: &str) -> StoreResult<Vec<(String, Document)>>;

    /// Subscribes to changes in one collection.
    fn subscribe(&self, collection: &str) -> Subscription;
}

/// Typed helpers over any [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn get_as<T: DeserializeOwned>(&self, collection: &str, id: &str) -> StoreResult<Option<T>> {
        match self.get(collection, id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> StoreResult<()> {
        self.set(collection, id, serde_json::to_value(value)?)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

// =============================================================================
// Change Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Upserted,
    Deleted,
}

/// One document change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

/// Broadcast side of a backend's change notifications.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        ChangeFeed { tx }
    }

    /// Publishes a change. Having no subscribers is fine.
    pub fn publish(&self, collection: &str, id: &str, kind: ChangeKind) {
        let _ = self.tx.send(Change {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }

    pub fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, vec![self.tx.subscribe()])
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives changes for one collection, possibly from several feeds.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    receivers: Vec<broadcast::Receiver<Change>>,
}

impl Subscription {
    pub fn new(collection: &str, receivers: Vec<broadcast::Receiver<Change>>) -> Self {
        Subscription {
            collection: collection.to_string(),
            receivers,
        }
    }

    /// Merges another subscription to the same collection into this one.
    pub fn merge(mut self, other: Subscription) -> Self {
        self.receivers.extend(other.receivers);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next change to this collection.
    ///
    /// Returns `None` once every feed is closed. A lagging receiver skips
    /// the missed changes; the next change still triggers a re-read.
    pub async fn recv(&mut self) -> Option<Change> {
        loop {
            if self.receivers.is_empty() {
                return None;
            }

            let (index, result) = next_from_any(&mut self.receivers).await;
            match result {
                Ok(change) if change.collection == self.collection => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        collection = %self.collection,
                        skipped,
                        "Change subscriber lagged, changes skipped"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receivers.remove(index);
                }
            }
        }
    }

    /// Returns a pending change without waiting, if there is one.
    pub fn try_recv(&mut self) -> Option<Change> {
        let collection = self.collection.clone();
        for rx in &mut self.receivers {
            loop {
                match rx.try_recv() {
                    Ok(change) if change.collection == collection => return Some(change),
                    Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
        None
    }
}

/// Waits on the first receiver that yields. Only the first two receivers
/// are polled; a subscription merges at most a remote and a local feed.
async fn next_from_any(
    receivers: &mut [broadcast::Receiver<Change>],
) -> (usize, Result<Change, broadcast::error::RecvError>) {
    match receivers {
        [only] => (0, only.recv().await),
        [first, second, ..] => {
            tokio::select! {
                result = first.recv() => (0, result),
                result = second.recv() => (1, result),
            }
        }
        [] => (0, Err(broadcast::error::RecvError::Closed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_filters_collection() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe(collections::ORDERS);

        feed.publish(collections::MENU_ITEMS, "m1", ChangeKind::Upserted);
        feed.publish(collections::ORDERS, "o1", ChangeKind::Deleted);

        let change = sub.recv().await.unwrap();
        assert_eq!(change.id, "o1");
        assert_eq!(change.kind, ChangeKind::Deleted);
    }

    #[tokio::test]
    async fn test_merged_subscription_hears_both_feeds() {
        let remote = ChangeFeed::new();
        let local = ChangeFeed::new();
        let mut sub = remote
            .subscribe(collections::ORDERS)
            .merge(local.subscribe(collections::ORDERS));

        local.publish(collections::ORDERS, "from-local", ChangeKind::Upserted);
        assert_eq!(sub.recv().await.unwrap().id, "from-local");

        remote.publish(collections::ORDERS, "from-remote", ChangeKind::Upserted);
        assert_eq!(sub.recv().await.unwrap().id, "from-remote");
    }

    #[tokio::test]
    async fn test_closed_feed_ends_subscription() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe(collections::ORDERS);
        drop(feed);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_try_recv() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe(collections::SETTINGS);
        assert!(sub.try_recv().is_none());
        feed.publish(collections::SETTINGS, "announcement", ChangeKind::Upserted);
        assert_eq!(sub.try_recv().unwrap().id, "announcement");
    }
}
