//! # In-Memory Store
//!
//! A [`DocumentStore`] held entirely in process memory. Used as the remote
//! backend in tests and single-process deployments.
//!
//! The store can be switched offline, after which every call fails with
//! `StoreError::Unavailable`, the same way a dropped connection to a hosted
//! document store would surface.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::document::{ChangeFeed, ChangeKind, Document, DocumentStore, Subscription};
use crate::error::{StoreError, StoreResult};

type Collections = HashMap<String, BTreeMap<String, Document>>;

#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    collections: RwLock<Collections>,
    online: AtomicBool,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Creates a store whose name appears in logs and errors.
    pub fn named(name: impl Into<String>) -> Self {
        MemoryStore {
            name: name.into(),
            collections: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            feed: ChangeFeed::new(),
        }
    }

    /// Simulates losing or regaining the connection.
    pub fn set_online(&self, online: bool) {
        debug!(store = %self.name, online, "Store connectivity changed");
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("{} is offline", self.name)))
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Internal(format!("{} lock poisoned", self.name)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Internal(format!("{} lock poisoned", self.name)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.ensure_online()?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn set(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        self.ensure_online()?;
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        self.feed.publish(collection, id, ChangeKind::Upserted);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.ensure_online()?;
        let removed = self
            .write()?
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.feed.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(())
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        self.ensure_online()?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}
