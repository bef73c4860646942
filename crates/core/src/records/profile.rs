//! The `patientProfile` singleton.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::merge;
use crate::store::{self, PutResult};

/// Document type of the patient profile singleton.
pub const DOCUMENT_TYPE: &str = "patientProfile";

/// Returns the current profile, or `None` if none has been stored.
pub fn get_profile<C: RevisionStore>(collection: &C) -> StoreResult<Option<Document>> {
    store::get_singleton(collection, DOCUMENT_TYPE)
}

/// Stores a new revision of the profile.
pub fn put_profile<C: RevisionStore>(
    collection: &C,
    profile: Document,
) -> StoreResult<PutResult> {
    store::put_singleton(collection, DOCUMENT_TYPE, profile)
}

/// Shallow-merges a partial profile over the current one. Backfill only; see
/// [`crate::merge`].
pub fn unsafe_update_profile<C: RevisionStore>(
    collection: &C,
    partial: Document,
) -> StoreResult<PutResult> {
    merge::unsafe_update_singleton(collection, DOCUMENT_TYPE, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryCollection;
    use crate::document::TYPE_FIELD;
    use serde_json::json;

    #[test]
    fn profile_revisions_carry_the_fixed_type() {
        let collection = MemoryCollection::new();
        let document = Document::from_value(json!({"name": "p"})).unwrap();
        let result = put_profile(&collection, document).unwrap();
        assert_eq!(result.document.get(TYPE_FIELD).unwrap(), &json!(DOCUMENT_TYPE));
        assert_eq!(get_profile(&collection).unwrap().unwrap(), result.document);
    }
}
