//! Collection store operations.
//!
//! The six operations below implement the "singleton" and "set" document
//! patterns over any [`RevisionStore`] backing. Every operation takes the
//! collection handle as an explicit parameter — there is deliberately no
//! process-wide store handle, so independent collections (and tests) can
//! coexist in one process without shared mutable state.
//!
//! ## Revision protocol
//!
//! Callers never supply `_id` or `_rev`; the store assigns both. Each write
//! reads the identity's current revision, derives `next_rev`, and attempts an
//! insert keyed (`_type`, `_set_id`, `_rev`). That insert is the
//! optimistic-concurrency checkpoint: when two writers race on the same base
//! revision, the backing accepts exactly one and the other receives
//! [`StoreError::RevisionConflict`] carrying the now-current document, so the
//! caller can re-render and retry against a fresh base without a second
//! round trip. Nothing is ever overwritten — "current" is always the
//! maximum-`_rev` member of an identity's append-only chain.

use crate::backing::{InsertOutcome, RevisionStore};
use crate::document::{Document, Identity, Revision, ID_FIELD, REV_FIELD, SET_ID_FIELD};
use crate::error::{StoreError, StoreResult};
use chartstore_ident::RecordId;
use chartstore_types::DocumentType;
use serde_json::Value;

/// Result of a successful singleton put.
#[derive(Clone, Debug, PartialEq)]
pub struct PutResult {
    /// Identifier assigned to the stored revision.
    pub id: RecordId,
    /// Revision number assigned to the stored revision.
    pub rev: Revision,
    /// The stored document, envelope included.
    pub document: Document,
}

/// Result of a successful set element post (creation).
#[derive(Clone, Debug, PartialEq)]
pub struct SetPostResult {
    /// Identifier assigned to the stored revision.
    pub id: RecordId,
    /// The freshly minted set element identifier.
    pub set_id: RecordId,
    /// Revision number assigned to the stored revision (always the first).
    pub rev: Revision,
    /// The stored document, envelope included.
    pub document: Document,
}

/// Result of a successful set element put (update).
#[derive(Clone, Debug, PartialEq)]
pub struct SetPutResult {
    /// Identifier assigned to the stored revision.
    pub id: RecordId,
    /// Revision number assigned to the stored revision.
    pub rev: Revision,
    /// The stored document, envelope included.
    pub document: Document,
}

/// Returns the current document for a singleton identity, or `None` if no
/// revision has ever been written.
pub fn get_singleton<C: RevisionStore>(
    collection: &C,
    document_type: &str,
) -> StoreResult<Option<Document>> {
    let identity = Identity::singleton(document_type_argument(document_type)?);
    collection.current(&identity)
}

/// Inserts a new revision of a singleton document.
///
/// The document must not carry `_id`, `_rev`, or `_set_id`. On success the
/// stored revision (with assigned `_id` and `_rev`) is returned.
///
/// # Errors
///
/// - `StoreError::InvalidArgument` if the document carries forbidden
///   envelope fields.
/// - `StoreError::RevisionConflict` if a concurrent writer inserted a
///   revision between this operation's read and its insert.
pub fn put_singleton<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    document: Document,
) -> StoreResult<PutResult> {
    let document_type = document_type_argument(document_type)?;
    reject_envelope_field(&document, ID_FIELD)?;
    reject_envelope_field(&document, REV_FIELD)?;
    reject_envelope_field(&document, SET_ID_FIELD)?;

    let identity = Identity::singleton(document_type.clone());
    let rev = next_revision(collection.current(&identity)?.as_ref())?;

    let mut document = document;
    document.set_envelope_type(&document_type);
    document.set_envelope_rev(rev);
    let id = RecordId::generate();
    document.set_envelope_id(&id);

    let document = insert_or_conflict(collection, &identity, document)?;
    Ok(PutResult { id, rev, document })
}

/// Returns the current document for every distinct `_set_id` under a set
/// kind, ordered by ascending `_set_id`.
///
/// A kind with no elements yields an empty sequence, uniformly — callers that
/// need to distinguish "never initialised" from "empty" must track that
/// themselves (the sentinel document exists for collections as a whole).
pub fn get_set<C: RevisionStore>(
    collection: &C,
    document_type: &str,
) -> StoreResult<Vec<Document>> {
    let document_type = document_type_argument(document_type)?;
    let mut keyed = Vec::new();
    for document in collection.current_set(&document_type)? {
        let set_id = document.set_id()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!(
                "set element of {document_type} is missing {SET_ID_FIELD}"
            ))
        })?;
        keyed.push((set_id, document));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, document)| document).collect())
}

/// Returns the current document for one semantic set element, or `None`.
pub fn get_set_element<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    set_id: &str,
) -> StoreResult<Option<Document>> {
    let identity = Identity::set_element(
        document_type_argument(document_type)?,
        set_id_argument(set_id)?,
    );
    collection.current(&identity)
}

/// Creates a new set element with a freshly minted `_set_id` and `_rev = 1`.
///
/// The document must not carry `_id`, `_rev`, `_set_id`, or the semantic set
/// id field (`semantic_set_id`); the store mints the element identifier and
/// mirrors it into the semantic field.
///
/// # Errors
///
/// `StoreError::InvalidArgument` if the document carries any of the forbidden
/// fields.
pub fn post_set_element<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    semantic_set_id: &str,
    document: Document,
) -> StoreResult<SetPostResult> {
    let document_type = document_type_argument(document_type)?;
    let semantic_set_id = semantic_field_argument(semantic_set_id)?;
    reject_envelope_field(&document, ID_FIELD)?;
    reject_envelope_field(&document, REV_FIELD)?;
    reject_envelope_field(&document, SET_ID_FIELD)?;
    reject_envelope_field(&document, semantic_set_id)?;

    let set_id = RecordId::generate();
    let identity = Identity::set_element(document_type.clone(), set_id.clone());

    let mut document = document;
    document.set_envelope_type(&document_type);
    document.set_envelope_set_id(&set_id);
    document.set_field(semantic_set_id, Value::String(set_id.to_string()));
    document.set_envelope_rev(Revision::FIRST);
    let id = RecordId::generate();
    document.set_envelope_id(&id);

    let document = insert_or_conflict(collection, &identity, document)?;
    Ok(SetPostResult {
        id,
        set_id,
        rev: Revision::FIRST,
        document,
    })
}

/// Inserts a new revision of one semantic set element.
///
/// The document must not carry `_id` or `_rev`. If it carries `_set_id` or
/// the semantic set id field, each must match the `set_id` parameter
/// (mismatched identity is rejected).
///
/// # Errors
///
/// - `StoreError::InvalidArgument` on forbidden or mismatched envelope
///   fields.
/// - `StoreError::RevisionConflict` if a concurrent writer inserted a
///   revision between this operation's read and its insert; the error
///   carries the now-current document.
pub fn put_set_element<C: RevisionStore>(
    collection: &C,
    document_type: &str,
    semantic_set_id: &str,
    set_id: &str,
    document: Document,
) -> StoreResult<SetPutResult> {
    let document_type = document_type_argument(document_type)?;
    let semantic_set_id = semantic_field_argument(semantic_set_id)?;
    let set_id = set_id_argument(set_id)?;
    reject_envelope_field(&document, ID_FIELD)?;
    reject_envelope_field(&document, REV_FIELD)?;

    if let Some(carried) = document.set_id()? {
        if carried != set_id {
            return Err(StoreError::InvalidArgument(format!(
                "document {SET_ID_FIELD} {carried} does not match target set id {set_id}"
            )));
        }
    }
    if let Some(carried) = document.get(semantic_set_id) {
        if carried.as_str() != Some(set_id.as_str()) {
            return Err(StoreError::InvalidArgument(format!(
                "document {semantic_set_id} {carried} does not match target set id {set_id}"
            )));
        }
    }

    let identity = Identity::set_element(document_type.clone(), set_id.clone());
    let rev = next_revision(collection.current(&identity)?.as_ref())?;

    let mut document = document;
    document.set_envelope_type(&document_type);
    document.set_envelope_set_id(&set_id);
    document.set_field(semantic_set_id, Value::String(set_id.to_string()));
    document.set_envelope_rev(rev);
    let id = RecordId::generate();
    document.set_envelope_id(&id);

    let document = insert_or_conflict(collection, &identity, document)?;
    Ok(SetPutResult { id, rev, document })
}

fn document_type_argument(document_type: &str) -> StoreResult<DocumentType> {
    DocumentType::new(document_type)
        .map_err(|e| StoreError::InvalidArgument(format!("document type: {e}")))
}

fn set_id_argument(set_id: &str) -> StoreResult<RecordId> {
    RecordId::parse(set_id).map_err(|e| StoreError::InvalidArgument(format!("set id: {e}")))
}

fn semantic_field_argument(semantic_set_id: &str) -> StoreResult<&str> {
    if semantic_set_id.trim().is_empty() {
        return Err(StoreError::InvalidArgument(
            "semantic set id field name must be non-empty".into(),
        ));
    }
    Ok(semantic_set_id)
}

fn reject_envelope_field(document: &Document, field: &str) -> StoreResult<()> {
    if document.has_field(field) {
        return Err(StoreError::InvalidArgument(format!(
            "document must not carry {field}"
        )));
    }
    Ok(())
}

fn next_revision(current: Option<&Document>) -> StoreResult<Revision> {
    match current {
        Some(document) => {
            let rev = document.rev()?.ok_or_else(|| {
                StoreError::InvalidEnvelope("current document is missing a revision".into())
            })?;
            Ok(rev.next())
        }
        None => Ok(Revision::FIRST),
    }
}

/// Attempts the insert; on a duplicate key, re-fetches the now-current
/// document and surfaces it in the conflict.
fn insert_or_conflict<C: RevisionStore>(
    collection: &C,
    identity: &Identity,
    document: Document,
) -> StoreResult<Document> {
    match collection.insert_unique(document.clone())? {
        InsertOutcome::Inserted => Ok(document),
        InsertOutcome::DuplicateRevision => {
            let current = collection.current(identity)?;
            tracing::debug!("revision conflict on {}", identity);
            Err(StoreError::RevisionConflict {
                identity: identity.clone(),
                current: current.map(Box::new),
            })
        }
    }
}
