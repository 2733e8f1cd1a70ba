//! # Bulk Copy and Wipe
//!
//! Whole-collection operations across stores: moving a device's local data
//! into a newly configured remote store, reconciling after an outage and
//! resetting a store.

use tracing::{debug, info};

use crate::document::DocumentStore;
use crate::error::StoreResult;

/// Copies every document of `names` from `from` into `to`.
///
/// Documents already present in `to` are overwritten; documents only in
/// `to` are kept. Returns the number of documents written.
pub fn copy_collections<F, T>(from: &F, to: &T, names: &[&str]) -> StoreResult<usize>
where
    F: DocumentStore + ?Sized,
    T: DocumentStore + ?Sized,
{
    let mut copied = 0;

    for &collection in names {
        let docs = from.scan(collection)?;
        debug!(collection, count = docs.len(), "Copying collection");
        for (id, doc) in docs {
            to.set(collection, &id, doc)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Deletes every document of `names`. Returns the number removed.
pub fn clear_collections<S>(store: &S, names: &[&str]) -> StoreResult<usize>
where
    S: DocumentStore + ?Sized,
{
    let mut removed = 0;

    for &collection in names {
        for (id, _) in store.scan(collection)? {
            store.delete(collection, &id)?;
            removed += 1;
        }
    }

    info!(removed, "Cleared collections");
    Ok(removed)
}
