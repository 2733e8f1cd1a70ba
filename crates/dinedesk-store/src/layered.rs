//! # Layered Store
//!
//! Remote store as the source of truth, local store as a write-through
//! cache that keeps the app working while the remote is unreachable.
//!
//! ## Resolution Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WRITE (set / delete)                                                   │
//! │    remote ──ok──► local (failure here is logged, remote already has it) │
//! │      │                                                                  │
//! │      └─Unavailable──► warn! ──► local ──ok──► Ok (kept until reconcile) │
//! │                                   └──err──► error to caller             │
//! │                                                                         │
//! │  READ (get / scan)                                                      │
//! │    remote ──ok──► result                                                │
//! │      └─Unavailable──► local                                             │
//! │                                                                         │
//! │  Any other remote error is returned as-is.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes made while offline live only in the local store until
//! [`LayeredStore::reconcile`] copies them up.

use tracing::{debug, info, warn};

use crate::document::{collections, Document, DocumentStore, Subscription};
use crate::error::StoreResult;
use crate::migrate::copy_collections;

#[derive(Debug)]
pub struct LayeredStore<R, L> {
    remote: R,
    local: L,
}

impl<R: DocumentStore, L: DocumentStore> LayeredStore<R, L> {
    pub fn new(remote: R, local: L) -> Self {
        LayeredStore { remote, local }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Pushes every local document to the remote store.
    ///
    /// Call once the remote is reachable again. Remote documents that the
    /// local cache does not have are left alone. Returns the number of
    /// documents copied.
    pub fn reconcile(&self) -> StoreResult<usize> {
        let copied = copy_collections(&self.local, &self.remote, collections::ALL)?;
        info!(copied, "Reconciled local cache into remote store");
        Ok(copied)
    }

    fn write_through(
        &self,
        op: &str,
        collection: &str,
        id: &str,
        remote: impl FnOnce(&R) -> StoreResult<()>,
        local: impl FnOnce(&L) -> StoreResult<()>,
    ) -> StoreResult<()> {
        match remote(&self.remote) {
            Ok(()) => {
                if let Err(err) = local(&self.local) {
                    warn!(op, collection, id, error = %err, "Local cache write failed");
                }
                Ok(())
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    op,
                    collection,
                    id,
                    error = %err,
                    "Remote store unavailable, keeping write in local cache"
                );
                local(&self.local)
            }
            Err(err) => Err(err),
        }
    }
}

impl<R: DocumentStore, L: DocumentStore> DocumentStore for LayeredStore<R, L> {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        match self.remote.get(collection, id) {
            Err(err) if err.is_unavailable() => {
                debug!(collection, id, "Remote unavailable, reading local cache");
                self.local.get(collection, id)
            }
            other => other,
        }
    }

    fn set(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        let local_doc = doc.clone();
        self.write_through(
            "set",
            collection,
            id,
            |remote| remote.set(collection, id, doc),
            |local| local.set(collection, id, local_doc),
        )
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.write_through(
            "delete",
            collection,
            id,
            |remote| remote.delete(collection, id),
            |local| local.delete(collection, id),
        )
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        match self.remote.scan(collection) {
            Err(err) if err.is_unavailable() => {
                debug!(collection, "Remote unavailable, scanning local cache");
                self.local.scan(collection)
            }
            other => other,
        }
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.remote
            .subscribe(collection)
            .merge(self.local.subscribe(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn layered() -> LayeredStore<MemoryStore, MemoryStore> {
        LayeredStore::new(MemoryStore::named("remote"), MemoryStore::named("local"))
    }

    #[test]
    fn test_writes_reach_both_layers() {
        let store = layered();
        store.set("orders", "o1", json!({"n": 1})).unwrap();

        assert!(store.remote().get("orders", "o1").unwrap().is_some());
        assert!(store.local().get("orders", "o1").unwrap().is_some());

        store.delete("orders", "o1").unwrap();
        assert!(store.remote().get("orders", "o1").unwrap().is_none());
        assert!(store.local().get("orders", "o1").unwrap().is_none());
    }

    #[test]
    fn test_remote_outage_keeps_write_locally() {
        let store = layered();
        store.remote().set_online(false);

        store.set("orders", "o1", json!({"n": 1})).unwrap();
        assert_eq!(store.get("orders", "o1").unwrap(), Some(json!({"n": 1})));
        assert_eq!(store.scan("orders").unwrap().len(), 1);

        store.remote().set_online(true);
        assert!(store.get("orders", "o1").unwrap().is_none());

        assert_eq!(store.reconcile().unwrap(), 1);
        assert_eq!(store.get("orders", "o1").unwrap(), Some(json!({"n": 1})));
    }

    #[test]
    fn test_both_layers_down_is_an_error() {
        let store = layered();
        store.remote().set_online(false);
        store.local().set_online(false);

        let err = store.set("orders", "o1", json!({})).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_local_failure_after_remote_success_is_not_an_error() {
        let store = layered();
        store.local().set_online(false);

        store.set("orders", "o1", json!({})).unwrap();
        assert!(store.remote().get("orders", "o1").unwrap().is_some());
    }
}
