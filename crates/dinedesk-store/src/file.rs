//! # JSON File Store
//!
//! A [`DocumentStore`] persisted as one JSON file per collection on the
//! device. This is the local cache behind the remote store.
//!
//! ## On-Disk Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  <data_dir>/                                                            │
//! │   ├── orders.json        { "<id>": { …order… }, … }                     │
//! │   ├── menuItems.json                                                    │
//! │   ├── settings.json                                                     │
//! │   └── deletedOrders.json                                                │
//! │                                                                         │
//! │  Writes go to `<name>.json.tmp` first, then rename over the old file,   │
//! │  so a crash mid-write leaves the previous version intact.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Collections are loaded lazily on first access and kept in memory.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::document::{ChangeFeed, ChangeKind, Document, DocumentStore, Subscription};
use crate::error::{StoreError, StoreResult};

type CollectionDocs = BTreeMap<String, Document>;

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, CollectionDocs>>,
    feed: ChangeFeed,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;

        info!(path = %dir.display(), "Opened JSON file store");

        Ok(JsonFileStore {
            dir,
            cache: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn load(&self, collection: &str) -> StoreResult<CollectionDocs> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(CollectionDocs::new());
        }

        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(CollectionDocs::new());
        }

        let docs: CollectionDocs = serde_json::from_str(&contents)?;
        debug!(collection, count = docs.len(), "Loaded collection from disk");
        Ok(docs)
    }

    fn persist(&self, collection: &str, docs: &CollectionDocs) -> StoreResult<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(docs)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Runs `f` against the cached collection, loading it first if needed.
    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut CollectionDocs) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| StoreError::Internal("file store lock poisoned".to_string()))?;

        if !cache.contains_key(collection) {
            let docs = self.load(collection)?;
            cache.insert(collection.to_string(), docs);
        }

        match cache.get_mut(collection) {
            Some(docs) => f(docs),
            None => Err(StoreError::Internal(format!("{collection} not cached"))),
        }
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.with_collection(collection, |docs| Ok(docs.get(id).cloned()))
    }

    fn set(&self, collection: &str, id: &str, doc: Document) -> StoreResult<()> {
        self.with_collection(collection, |docs| {
            let previous = docs.insert(id.to_string(), doc);
            if let Err(err) = self.persist(collection, docs) {
                // keep memory and disk in step
                match previous {
                    Some(old) => docs.insert(id.to_string(), old),
                    None => docs.remove(id),
                };
                return Err(err);
            }
            Ok(())
        })?;

        self.feed.publish(collection, id, ChangeKind::Upserted);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let removed = self.with_collection(collection, |docs| {
            let Some(old) = docs.remove(id) else {
                return Ok(false);
            };
            if let Err(err) = self.persist(collection, docs) {
                docs.insert(id.to_string(), old);
                return Err(err);
            }
            Ok(true)
        })?;

        if removed {
            self.feed.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(())
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        self.with_collection(collection, |docs| {
            Ok(docs
                .iter()
                .map(|(id, doc)| (id.clone(), doc.clone()))
                .collect())
        })
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.feed.subscribe(collection)
    }
}
