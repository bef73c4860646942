//! The `valuesInventory` singleton.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::merge;
use crate::store::{self, PutResult};

/// Document type of the values inventory singleton.
pub const DOCUMENT_TYPE: &str = "valuesInventory";

/// Returns the current values inventory, or `None` if none has been stored.
pub fn get_values_inventory<C: RevisionStore>(collection: &C) -> StoreResult<Option<Document>> {
    store::get_singleton(collection, DOCUMENT_TYPE)
}

/// Stores a new revision of the values inventory.
pub fn put_values_inventory<C: RevisionStore>(
    collection: &C,
    values_inventory: Document,
) -> StoreResult<PutResult> {
    store::put_singleton(collection, DOCUMENT_TYPE, values_inventory)
}

/// Shallow-merges a partial values inventory over the current one. Backfill
/// only; see [`crate::merge`].
pub fn unsafe_update_values_inventory<C: RevisionStore>(
    collection: &C,
    partial: Document,
) -> StoreResult<PutResult> {
    merge::unsafe_update_singleton(collection, DOCUMENT_TYPE, partial)
}
