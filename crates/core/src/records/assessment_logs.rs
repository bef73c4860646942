//! The `assessmentLog` set.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::store::{self, SetPostResult, SetPutResult};

/// Document type of assessment log set elements.
pub const DOCUMENT_TYPE: &str = "assessmentLog";
/// Field carrying the semantic element identifier.
pub const SEMANTIC_SET_ID: &str = "assessmentLogId";

/// Returns the current revision of every assessment log, ordered by
/// `_set_id`.
pub fn get_assessment_logs<C: RevisionStore>(collection: &C) -> StoreResult<Vec<Document>> {
    store::get_set(collection, DOCUMENT_TYPE)
}

/// Returns the current revision of one assessment log, or `None`.
pub fn get_assessment_log<C: RevisionStore>(
    collection: &C,
    set_id: &str,
) -> StoreResult<Option<Document>> {
    store::get_set_element(collection, DOCUMENT_TYPE, set_id)
}

/// Creates a new assessment log with a freshly minted identifier.
pub fn post_assessment_log<C: RevisionStore>(
    collection: &C,
    assessment_log: Document,
) -> StoreResult<SetPostResult> {
    store::post_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, assessment_log)
}

/// Stores a new revision of one assessment log.
pub fn put_assessment_log<C: RevisionStore>(
    collection: &C,
    set_id: &str,
    assessment_log: Document,
) -> StoreResult<SetPutResult> {
    store::put_set_element(
        collection,
        DOCUMENT_TYPE,
        SEMANTIC_SET_ID,
        set_id,
        assessment_log,
    )
}
