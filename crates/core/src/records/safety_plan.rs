//! The `safetyPlan` singleton.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::merge;
use crate::store::{self, PutResult};

/// Document type of the safety plan singleton.
pub const DOCUMENT_TYPE: &str = "safetyPlan";

/// Returns the current safety plan, or `None` if none has been stored.
pub fn get_safety_plan<C: RevisionStore>(collection: &C) -> StoreResult<Option<Document>> {
    store::get_singleton(collection, DOCUMENT_TYPE)
}

/// Stores a new revision of the safety plan.
pub fn put_safety_plan<C: RevisionStore>(
    collection: &C,
    safety_plan: Document,
) -> StoreResult<PutResult> {
    store::put_singleton(collection, DOCUMENT_TYPE, safety_plan)
}

/// Shallow-merges a partial safety plan over the current one. Backfill only;
/// see [`crate::merge`].
pub fn unsafe_update_safety_plan<C: RevisionStore>(
    collection: &C,
    partial: Document,
) -> StoreResult<PutResult> {
    merge::unsafe_update_singleton(collection, DOCUMENT_TYPE, partial)
}
