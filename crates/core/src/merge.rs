//! Shallow-merge update helpers for offline administrative backfill.
//!
//! These helpers read the current document, merge a partial document over it
//! top-level key by top-level key (the partial wins), and submit the result
//! through the ordinary put path. The read and the put are not one atomic
//! step: a concurrent writer can land between them and the merge base is then
//! stale. The put still conflicts rather than silently clobbering, but the
//! caller must not assume the merge and any concurrent write compose. Use
//! these from maintenance scripts against quiesced data, never from request
//! handlers.

use crate::backing::RevisionStore;
use crate::document::{Document, ID_FIELD, REV_FIELD};
use crate::error::StoreResult;
use crate::store::{self, PutResult, SetPutResult};

/// Merges a partial document over the current singleton revision and stores
/// the result as a new revision.
///
/// When no revision exists yet, the partial alone becomes the first revision.
/// The merge is shallow: nested objects in the partial replace their
/// counterparts wholesale.
pub fn unsafe_update_singleton<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    partial: Document,
) -> StoreResult<PutResult> {
    let base = store::get_singleton(collection, document_type)?;
    let merged = merge_over(base, partial);
    store::put_singleton(collection, document_type, merged)
}

/// Merges a partial document over the current revision of one set element
/// and stores the result as a new revision.
pub fn unsafe_update_set_element<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    semantic_set_id: &str,
    set_id: &str,
    partial: Document,
) -> StoreResult<SetPutResult> {
    let base = store::get_set_element(collection, document_type, set_id)?;
    let merged = merge_over(base, partial);
    store::put_set_element(collection, document_type, semantic_set_id, set_id, merged)
}

/// Overlays `partial` on `base` one top-level key at a time, then strips the
/// per-revision envelope fields so the put path can assign fresh ones.
fn merge_over(base: Option<Document>, partial: Document) -> Document {
    let mut fields = base.map(Document::into_fields).unwrap_or_default();
    for (key, value) in partial.into_fields() {
        fields.insert(key, value);
    }
    let mut merged = Document::from(fields);
    merged.remove_field(ID_FIELD);
    merged.remove_field(REV_FIELD);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryCollection;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn merge_keeps_untouched_keys_and_overwrites_named_ones() {
        let collection = MemoryCollection::new();
        store::put_singleton(
            &collection,
            "clinicalHistory",
            payload(json!({"primaryDiagnosis": "md", "pastHistory": "none"})),
        )
        .unwrap();

        let result = unsafe_update_singleton(
            &collection,
            "clinicalHistory",
            payload(json!({"pastHistory": "updated"})),
        )
        .unwrap();
        assert_eq!(result.rev.get(), 2);
        assert_eq!(
            result.document.get("primaryDiagnosis").unwrap(),
            &json!("md")
        );
        assert_eq!(result.document.get("pastHistory").unwrap(), &json!("updated"));
    }

    #[test]
    fn merge_is_shallow() {
        let collection = MemoryCollection::new();
        store::put_singleton(
            &collection,
            "safetyPlan",
            payload(json!({"contacts": {"a": 1, "b": 2}})),
        )
        .unwrap();

        let result = unsafe_update_singleton(
            &collection,
            "safetyPlan",
            payload(json!({"contacts": {"c": 3}})),
        )
        .unwrap();
        // Nested objects are replaced wholesale, not merged.
        assert_eq!(result.document.get("contacts").unwrap(), &json!({"c": 3}));
    }

    #[test]
    fn merge_without_a_base_stores_the_partial_as_first_revision() {
        let collection = MemoryCollection::new();
        let result = unsafe_update_singleton(
            &collection,
            "valuesInventory",
            payload(json!({"values": []})),
        )
        .unwrap();
        assert_eq!(result.rev.get(), 1);
    }

    #[test]
    fn set_element_merge_targets_one_element() {
        let collection = MemoryCollection::new();
        let first = store::post_set_element(
            &collection,
            "assessment",
            "assessmentId",
            payload(json!({"assigned": false, "kind": "phq9"})),
        )
        .unwrap();
        let second = store::post_set_element(
            &collection,
            "assessment",
            "assessmentId",
            payload(json!({"assigned": false, "kind": "gad7"})),
        )
        .unwrap();

        let result = unsafe_update_set_element(
            &collection,
            "assessment",
            "assessmentId",
            first.set_id.as_str(),
            payload(json!({"assigned": true})),
        )
        .unwrap();
        assert_eq!(result.rev.get(), 2);
        assert_eq!(result.document.get("kind").unwrap(), &json!("phq9"));

        // The sibling element is untouched.
        let sibling = store::get_set_element(&collection, "assessment", second.set_id.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(sibling, second.document);
    }
}
