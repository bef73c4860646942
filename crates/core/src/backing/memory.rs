//! In-memory collection backing.
//!
//! A `Mutex`-guarded map keyed exactly like the filesystem backing's paths:
//! (`_type`, `_set_id`, `_rev`). Intended for tests and embedding; the map
//! lock makes the insert-if-absent check-and-insert atomic.

use super::{InsertOutcome, RevisionStore};
use crate::document::{Document, Identity, Revision};
use crate::error::{StoreError, StoreResult};
use chartstore_types::DocumentType;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

type ChainKey = (String, Option<String>, u64);

/// A collection held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    entries: Mutex<BTreeMap<ChainKey, Document>>,
}

impl MemoryCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn chain_key(document: &Document) -> StoreResult<ChainKey> {
        let identity = document.identity()?;
        let revision = document.rev()?.ok_or_else(|| {
            StoreError::InvalidEnvelope("insert requires a revision number".into())
        })?;
        Ok(Self::key_for(&identity, revision))
    }

    fn key_for(identity: &Identity, revision: Revision) -> ChainKey {
        (
            identity.document_type().as_str().to_owned(),
            identity.set_id().map(|set_id| set_id.as_str().to_owned()),
            revision.get(),
        )
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, BTreeMap<ChainKey, Document>> {
        // A poisoned lock only means another writer panicked mid-insert; the
        // map itself is always in a consistent state because inserts are a
        // single map operation.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RevisionStore for MemoryCollection {
    fn insert_unique(&self, document: Document) -> StoreResult<InsertOutcome> {
        document.validate_stored()?;
        let key = Self::chain_key(&document)?;
        let mut entries = self.locked();
        if entries.contains_key(&key) {
            return Ok(InsertOutcome::DuplicateRevision);
        }
        entries.insert(key, document);
        Ok(InsertOutcome::Inserted)
    }

    fn current(&self, identity: &Identity) -> StoreResult<Option<Document>> {
        let document_type = identity.document_type().as_str();
        let set_id = identity.set_id().map(|s| s.as_str());
        let entries = self.locked();
        // Keys sort by (type, set_id, rev), so the last match is current.
        Ok(entries
            .iter()
            .filter(|((t, s, _), _)| t == document_type && s.as_deref() == set_id)
            .last()
            .map(|(_, document)| document.clone()))
    }

    fn current_set(&self, document_type: &DocumentType) -> StoreResult<Vec<Document>> {
        let entries = self.locked();
        let mut current: BTreeMap<String, Document> = BTreeMap::new();
        for ((t, s, _), document) in entries.iter() {
            if t != document_type.as_str() {
                continue;
            }
            let Some(set_id) = s else { continue };
            // Ascending rev order within a chain: later entries supersede.
            current.insert(set_id.clone(), document.clone());
        }
        Ok(current.into_values().collect())
    }

    fn at_revision(
        &self,
        identity: &Identity,
        revision: Revision,
    ) -> StoreResult<Option<Document>> {
        let key = Self::key_for(identity, revision);
        Ok(self.locked().get(&key).cloned())
    }

    fn all_documents(&self) -> StoreResult<Vec<Document>> {
        Ok(self.locked().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_document(document_type: &str, set_id: Option<&str>, rev: u64, id: &str) -> Document {
        let mut value = json!({
            "_id": id,
            "_rev": rev,
            "_type": document_type,
        });
        if let Some(set_id) = set_id {
            value["_set_id"] = json!(set_id);
        }
        Document::from_value(value).unwrap()
    }

    const ID_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ID_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const SET_1: &str = "11111111111111111111111111111111";

    #[test]
    fn insert_is_unique_per_revision() {
        let collection = MemoryCollection::new();
        let winner = stored_document("profile", None, 1, ID_A);
        assert_eq!(
            collection.insert_unique(winner.clone()).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            collection
                .insert_unique(stored_document("profile", None, 1, ID_B))
                .unwrap(),
            InsertOutcome::DuplicateRevision
        );
        let identity = winner.identity().unwrap();
        assert_eq!(collection.current(&identity).unwrap().unwrap(), winner);
    }

    #[test]
    fn current_tracks_maximum_revision() {
        let collection = MemoryCollection::new();
        collection
            .insert_unique(stored_document("profile", None, 1, ID_A))
            .unwrap();
        collection
            .insert_unique(stored_document("profile", None, 2, ID_B))
            .unwrap();

        let identity = stored_document("profile", None, 1, ID_A).identity().unwrap();
        let current = collection.current(&identity).unwrap().unwrap();
        assert_eq!(current.rev().unwrap().unwrap().get(), 2);
    }

    #[test]
    fn singleton_and_set_chains_are_distinct() {
        let collection = MemoryCollection::new();
        collection
            .insert_unique(stored_document("note", None, 1, ID_A))
            .unwrap();
        collection
            .insert_unique(stored_document("note", Some(SET_1), 1, ID_B))
            .unwrap();

        let document_type = DocumentType::new("note").unwrap();
        let singleton = collection
            .current(&Identity::singleton(document_type.clone()))
            .unwrap()
            .unwrap();
        assert!(singleton.is_singleton());

        let set = collection.current_set(&document_type).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set[0].is_set_element());
    }

    #[test]
    fn insert_requires_stored_envelope() {
        let collection = MemoryCollection::new();
        let bare = Document::from_value(json!({"_type": "profile"})).unwrap();
        assert!(matches!(
            collection.insert_unique(bare),
            Err(StoreError::InvalidEnvelope(_))
        ));
    }
}
