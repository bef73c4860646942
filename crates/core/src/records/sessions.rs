//! The `session` set.

use crate::backing::RevisionStore;
use crate::document::Document;
use crate::error::StoreResult;
use crate::store::{self, SetPostResult, SetPutResult};

/// Document type of session set elements.
pub const DOCUMENT_TYPE: &str = "session";
/// Field carrying the semantic element identifier.
pub const SEMANTIC_SET_ID: &str = "sessionId";

/// Returns the current revision of every session, ordered by `_set_id`.
pub fn get_sessions<C: RevisionStore>(collection: &C) -> StoreResult<Vec<Document>> {
    store::get_set(collection, DOCUMENT_TYPE)
}

/// Returns the current revision of one session, or `None`.
pub fn get_session<C: RevisionStore>(
    collection: &C,
    set_id: &str,
) -> StoreResult<Option<Document>> {
    store::get_set_element(collection, DOCUMENT_TYPE, set_id)
}

/// Creates a new session with a freshly minted identifier.
pub fn post_session<C: RevisionStore>(
    collection: &C,
    session: Document,
) -> StoreResult<SetPostResult> {
    store::post_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, session)
}

/// Stores a new revision of one session.
pub fn put_session<C: RevisionStore>(
    collection: &C,
    set_id: &str,
    session: Document,
) -> StoreResult<SetPutResult> {
    store::put_set_element(collection, DOCUMENT_TYPE, SEMANTIC_SET_ID, set_id, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryCollection;
    use serde_json::json;

    #[test]
    fn sessions_round_trip_through_the_fixed_kind() {
        let collection = MemoryCollection::new();
        let posted = post_session(
            &collection,
            Document::from_value(json!({"notes": "initial"})).unwrap(),
        )
        .unwrap();
        assert_eq!(
            posted.document.get(SEMANTIC_SET_ID).unwrap(),
            &json!(posted.set_id.as_str())
        );

        let updated = put_session(
            &collection,
            posted.set_id.as_str(),
            Document::from_value(json!({"notes": "amended"})).unwrap(),
        )
        .unwrap();
        assert_eq!(updated.rev.get(), 2);
        assert_eq!(get_sessions(&collection).unwrap().len(), 1);
    }
}
