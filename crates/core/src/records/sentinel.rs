//! The `sentinel` singleton.
//!
//! A sentinel marks a collection as initialised: a collection that exists but
//! holds no clinical documents yet is distinguishable from one that was never
//! created. Archive export keeps sentinels; reporting paths usually filter
//! them out.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::store;

/// Document type of the sentinel singleton.
pub const DOCUMENT_TYPE: &str = "sentinel";

/// Returns the sentinel, or `None` if the collection was never initialised.
pub fn get_sentinel<C: RevisionStore>(collection: &C) -> StoreResult<Option<Document>> {
    store::get_singleton(collection, DOCUMENT_TYPE)
}

/// Returns the sentinel, storing one first if none exists.
///
/// Idempotent, and safe against a concurrent initialiser: losing the insert
/// race means a sentinel now exists, which satisfies the caller.
pub fn ensure_sentinel<C: RevisionStore>(collection: &C) -> StoreResult<Document> {
    if let Some(existing) = get_sentinel(collection)? {
        return Ok(existing);
    }
    match store::put_singleton(collection, DOCUMENT_TYPE, Document::default()) {
        Ok(result) => Ok(result.document),
        Err(StoreError::RevisionConflict {
            current: Some(current),
            ..
        }) => Ok(*current),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryCollection;
    use crate::document::Revision;

    #[test]
    fn ensure_is_idempotent() {
        let collection = MemoryCollection::new();
        assert!(get_sentinel(&collection).unwrap().is_none());

        let first = ensure_sentinel(&collection).unwrap();
        assert_eq!(first.rev().unwrap().unwrap(), Revision::FIRST);

        let second = ensure_sentinel(&collection).unwrap();
        assert_eq!(first, second);
    }
}
