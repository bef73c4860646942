//! The `clinicalHistory` singleton.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::merge;
use crate::store::{self, PutResult};

/// Document type of the clinical history singleton.
pub const DOCUMENT_TYPE: &str = "clinicalHistory";

/// Returns the current clinical history, or `None` if none has been stored.
pub fn get_clinical_history<C: RevisionStore>(collection: &C) -> StoreResult<Option<Document>> {
    store::get_singleton(collection, DOCUMENT_TYPE)
}

/// Stores a new revision of the clinical history.
pub fn put_clinical_history<C: RevisionStore>(
    collection: &C,
    clinical_history: Document,
) -> StoreResult<PutResult> {
    store::put_singleton(collection, DOCUMENT_TYPE, clinical_history)
}

/// Shallow-merges a partial clinical history over the current one. Backfill
/// only; see [`crate::merge`].
pub fn unsafe_update_clinical_history<C: RevisionStore>(
    collection: &C,
    partial: Document,
) -> StoreResult<PutResult> {
    merge::unsafe_update_singleton(collection, DOCUMENT_TYPE, partial)
}
