//! The `assessment` set.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::merge;
use crate::store::{self, SetPostResult, SetPutResult};

/// Document type of assessment set elements.
pub const DOCUMENT_TYPE: &str = "assessment";
/// Field carrying the semantic element identifier.
pub const SEMANTIC_SET_ID: &str = "assessmentId";

/// Returns the current revision of every assessment, ordered by `_set_id`.
pub fn get_assessments<C: RevisionStore>(collection: &C) -> StoreResult<Vec<Document>> {
    store::get_set(collection, DOCUMENT_TYPE)
}

/// Returns the current revision of one assessment, or `None`.
pub fn get_assessment<C: RevisionStore>(
    collection: &C,
    set_id: &str,
) -> StoreResult<Option<Document>> {
    store::get_set_element(collection, DOCUMENT_TYPE, set_id)
}

/// Creates a new assessment with a freshly minted identifier.
pub fn post_assessment<C: RevisionStore>(
    collection: &C,
    assessment: Document,
) -> StoreResult<SetPostResult> {
    store::post_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, assessment)
}

/// Stores a new revision of one assessment.
pub fn put_assessment<C: RevisionStore>(
    collection: &C,
    set_id: &str,
    assessment: Document,
) -> StoreResult<SetPutResult> {
    store::put_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, set_id, assessment)
}

/// Shallow-merges a partial assessment over the current revision of one
/// element. Backfill only; see [`crate::merge`].
pub fn unsafe_update_assessment<C: RevisionStore>(
    collection: &C,
    set_id: &str,
    partial: Document,
) -> StoreResult<SetPutResult> {
    merge::unsafe_update_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, set_id, partial)
}
