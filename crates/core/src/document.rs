//! The shared document envelope and its invariants.
//!
//! Every record in chartstore is an opaque JSON object carrying a fixed
//! envelope:
//!
//! - `_id`: globally unique identifier, assigned by the store on creation,
//!   immutable thereafter, never supplied by a caller.
//! - `_rev`: positive integer revision number, starting at 1 and increasing
//!   by exactly 1 for each write to the same identity. Derived by the store,
//!   never supplied by a caller.
//! - `_type`: string discriminator naming the document's logical kind.
//! - `_set_id` (optional): present only for "set" document kinds, naming one
//!   semantic element within a multi-element collection of that `_type`.
//!
//! The *identity* of a document is (`_type`) for singletons, or
//! (`_type`, `_set_id`) for set elements. Writes never mutate a stored
//! document: every write inserts a new document carrying the next `_rev` for
//! its identity, so the store holds an append-only per-identity revision
//! chain. The "current" document for an identity is the chain member with the
//! maximum `_rev`.
//!
//! ## Canonical encoding
//!
//! Documents serialise with sorted keys (`serde_json`'s map is BTree-backed)
//! and two-space indentation, so semantically identical documents always
//! produce identical bytes. Storage, the archive codec, and tests all rely on
//! this.

use crate::error::{StoreError, StoreResult};
use chartstore_ident::RecordId;
use chartstore_types::DocumentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Envelope field holding the store-assigned revision identifier.
pub const ID_FIELD: &str = "_id";
/// Envelope field holding the revision number.
pub const REV_FIELD: &str = "_rev";
/// Envelope field holding the document's logical kind.
pub const TYPE_FIELD: &str = "_type";
/// Envelope field holding the set element identifier, for set kinds only.
pub const SET_ID_FIELD: &str = "_set_id";

/// A positive document revision number.
///
/// Revision chains start at [`Revision::FIRST`] and increase by exactly 1
/// per accepted write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// The first revision of any identity.
    pub const FIRST: Revision = Revision(1);

    /// Creates a revision from a raw value, which must be at least 1.
    pub fn new(value: u64) -> StoreResult<Self> {
        if value == 0 {
            return Err(StoreError::InvalidEnvelope(
                "revision number must be a positive integer".into(),
            ));
        }
        Ok(Self(value))
    }

    /// The revision following this one.
    pub fn next(self) -> Revision {
        Revision(self.0 + 1)
    }

    /// The raw revision number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The key naming one logical, revision-chained record.
///
/// Singletons are identified by their `_type` alone; set elements by
/// (`_type`, `_set_id`). `Ord` and `Hash` make identities usable as grouping
/// keys during revision collapse.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    document_type: DocumentType,
    set_id: Option<RecordId>,
}

impl Identity {
    /// Identity of a singleton document kind.
    pub fn singleton(document_type: DocumentType) -> Self {
        Self {
            document_type,
            set_id: None,
        }
    }

    /// Identity of one semantic element of a set document kind.
    pub fn set_element(document_type: DocumentType, set_id: RecordId) -> Self {
        Self {
            document_type,
            set_id: Some(set_id),
        }
    }

    /// The document kind this identity belongs to.
    pub fn document_type(&self) -> &DocumentType {
        &self.document_type
    }

    /// The set element identifier, if this names a set element.
    pub fn set_id(&self) -> Option<&RecordId> {
        self.set_id.as_ref()
    }

    /// True if this identity names a singleton kind.
    pub fn is_singleton(&self) -> bool {
        self.set_id.is_none()
    }

    /// True if this identity names one element of a set kind.
    pub fn is_set_element(&self) -> bool {
        self.set_id.is_some()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.set_id {
            Some(set_id) => write!(f, "{}/{}", self.document_type, set_id),
            None => write!(f, "{}", self.document_type),
        }
    }
}

/// An opaque JSON document plus the chartstore envelope.
///
/// The body is deliberately schemaless — clinical field semantics live with
/// the callers. This type only understands the envelope fields and provides
/// canonical serialisation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document (no body, no envelope).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` if the value is not a JSON
    /// object.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StoreError::InvalidArgument(format!(
                "document must be a JSON object, got {other}"
            ))),
        }
    }

    /// All fields of the document, envelope included.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the document, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// True if the named field is present.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Borrow a field's value, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The store-assigned identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` if `_id` is present but not a
    /// canonical identifier string.
    pub fn id(&self) -> StoreResult<Option<RecordId>> {
        self.record_id_field(ID_FIELD)
    }

    /// The revision number, if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` if `_rev` is present but not a
    /// positive integer.
    pub fn rev(&self) -> StoreResult<Option<Revision>> {
        match self.fields.get(REV_FIELD) {
            None => Ok(None),
            Some(value) => {
                let raw = value.as_u64().ok_or_else(|| {
                    StoreError::InvalidEnvelope(format!(
                        "{REV_FIELD} must be a positive integer, got {value}"
                    ))
                })?;
                Revision::new(raw).map(Some)
            }
        }
    }

    /// The logical kind discriminator, if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` if `_type` is present but not a
    /// valid document type string.
    pub fn document_type(&self) -> StoreResult<Option<DocumentType>> {
        match self.fields.get(TYPE_FIELD) {
            None => Ok(None),
            Some(value) => {
                let raw = value.as_str().ok_or_else(|| {
                    StoreError::InvalidEnvelope(format!(
                        "{TYPE_FIELD} must be a string, got {value}"
                    ))
                })?;
                DocumentType::new(raw)
                    .map(Some)
                    .map_err(|e| StoreError::InvalidEnvelope(format!("{TYPE_FIELD}: {e}")))
            }
        }
    }

    /// The set element identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` if `_set_id` is present but not
    /// a canonical identifier string.
    pub fn set_id(&self) -> StoreResult<Option<RecordId>> {
        self.record_id_field(SET_ID_FIELD)
    }

    /// True if the document carries a `_set_id` (a set element).
    pub fn is_set_element(&self) -> bool {
        self.fields.contains_key(SET_ID_FIELD)
    }

    /// True if the document does not carry a `_set_id` (a singleton).
    pub fn is_singleton(&self) -> bool {
        !self.is_set_element()
    }

    /// The identity this document belongs to.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` if `_type` is missing, or if
    /// `_type`/`_set_id` are present but malformed.
    pub fn identity(&self) -> StoreResult<Identity> {
        let document_type = self.document_type()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!("document is missing {TYPE_FIELD}"))
        })?;
        Ok(match self.set_id()? {
            Some(set_id) => Identity::set_element(document_type, set_id),
            None => Identity::singleton(document_type),
        })
    }

    /// Validates the full stored-form envelope: `_id`, `_rev` and `_type`
    /// must all be present and well-formed.
    ///
    /// Documents read back from a backing store or an archive must pass this
    /// before being trusted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEnvelope` describing the first violation.
    pub fn validate_stored(&self) -> StoreResult<()> {
        if self.id()?.is_none() {
            return Err(StoreError::InvalidEnvelope(format!(
                "stored document is missing {ID_FIELD}"
            )));
        }
        if self.rev()?.is_none() {
            return Err(StoreError::InvalidEnvelope(format!(
                "stored document is missing {REV_FIELD}"
            )));
        }
        self.identity()?;
        Ok(())
    }

    /// Serialises the document to its canonical byte encoding: sorted keys,
    /// two-space indentation, UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if encoding fails.
    pub fn canonical_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.fields).map_err(StoreError::Serialization)
    }

    fn record_id_field(&self, name: &str) -> StoreResult<Option<RecordId>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(value) => {
                let raw = value.as_str().ok_or_else(|| {
                    StoreError::InvalidEnvelope(format!("{name} must be a string, got {value}"))
                })?;
                RecordId::parse(raw)
                    .map(Some)
                    .map_err(|e| StoreError::InvalidEnvelope(format!("{name}: {e}")))
            }
        }
    }

    pub(crate) fn set_envelope_id(&mut self, id: &RecordId) {
        self.fields
            .insert(ID_FIELD.into(), Value::String(id.to_string()));
    }

    pub(crate) fn set_envelope_rev(&mut self, rev: Revision) {
        self.fields.insert(REV_FIELD.into(), Value::from(rev.get()));
    }

    pub(crate) fn set_envelope_type(&mut self, document_type: &DocumentType) {
        self.fields
            .insert(TYPE_FIELD.into(), Value::String(document_type.to_string()));
    }

    pub(crate) fn set_envelope_set_id(&mut self, set_id: &RecordId) {
        self.fields
            .insert(SET_ID_FIELD.into(), Value::String(set_id.to_string()));
    }

    pub(crate) fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_owned(), value);
    }

    pub(crate) fn remove_field(&mut self, name: &str) {
        self.fields.remove(name);
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(matches!(
            Document::from_value(json!([1, 2, 3])),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn envelope_accessors_read_back_fields() {
        let doc = document(json!({
            "_id": "550e8400e29b41d4a716446655440000",
            "_rev": 3,
            "_type": "assessment",
            "_set_id": "00000000000000000000000000000001",
            "assigned": true,
        }));

        assert_eq!(
            doc.id().unwrap().unwrap().as_str(),
            "550e8400e29b41d4a716446655440000"
        );
        assert_eq!(doc.rev().unwrap().unwrap().get(), 3);
        assert_eq!(
            doc.document_type().unwrap().unwrap().as_str(),
            "assessment"
        );
        assert!(doc.is_set_element());
        doc.validate_stored().unwrap();
    }

    #[test]
    fn identity_distinguishes_singleton_from_set_element() {
        let singleton = document(json!({"_type": "valuesInventory"}));
        let identity = singleton.identity().unwrap();
        assert!(identity.is_singleton());
        assert_eq!(identity.to_string(), "valuesInventory");

        let element = document(json!({
            "_type": "assessment",
            "_set_id": "00000000000000000000000000000001",
        }));
        let identity = element.identity().unwrap();
        assert!(identity.is_set_element());
        assert_eq!(
            identity.to_string(),
            "assessment/00000000000000000000000000000001"
        );
    }

    #[test]
    fn identity_requires_type() {
        let doc = document(json!({"values": []}));
        assert!(matches!(
            doc.identity(),
            Err(StoreError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn rev_rejects_zero_and_non_integers() {
        let zero = document(json!({"_rev": 0}));
        assert!(matches!(zero.rev(), Err(StoreError::InvalidEnvelope(_))));

        let fractional = document(json!({"_rev": 1.5}));
        assert!(matches!(
            fractional.rev(),
            Err(StoreError::InvalidEnvelope(_))
        ));

        let negative = document(json!({"_rev": -1}));
        assert!(matches!(
            negative.rev(),
            Err(StoreError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn validate_stored_requires_full_envelope() {
        let missing_id = document(json!({"_rev": 1, "_type": "profile"}));
        assert!(missing_id.validate_stored().is_err());

        let missing_rev = document(json!({
            "_id": "550e8400e29b41d4a716446655440000",
            "_type": "profile",
        }));
        assert!(missing_rev.validate_stored().is_err());
    }

    #[test]
    fn canonical_bytes_ignore_insertion_order() {
        let a = document(json!({"b": 1, "a": 2, "_type": "profile"}));
        let b = document(json!({"_type": "profile", "a": 2, "b": 1}));
        assert_eq!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }

    #[test]
    fn revision_ordering_and_next() {
        let first = Revision::FIRST;
        assert_eq!(first.get(), 1);
        assert!(first < first.next());
        assert_eq!(first.next().get(), 2);
        assert!(Revision::new(0).is_err());
    }
}
