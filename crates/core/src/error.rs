use crate::document::{Document, Identity};

/// Errors raised by the collection store and its backings.
///
/// All variants are terminal failures of the single operation that raised
/// them; the store never retries internally. Retry policy, if any, belongs to
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A caller-supplied document violates the envelope rules (carries `_id`
    /// where forbidden, carries `_rev`, or carries a `_set_id` mismatching
    /// the target identity). Recovered by the caller correcting the request.
    #[error("invalid document: {0}")]
    InvalidArgument(String),
    /// A stored document's envelope is malformed. This indicates corruption
    /// or external interference in the backing store, not a caller error.
    #[error("invalid stored document envelope: {0}")]
    InvalidEnvelope(String),
    /// Optimistic-concurrency loss: another writer inserted a revision for
    /// this identity between this operation's read and its insert. Carries
    /// the now-current document so the caller can re-render and retry with a
    /// fresh base revision without a second round trip. Expected and routine,
    /// not fatal.
    #[error("revision conflict on {identity}")]
    RevisionConflict {
        identity: Identity,
        current: Option<Box<Document>>,
    },
    #[error("invalid collection directory: {0}")]
    InvalidCollectionDir(String),
    #[error("failed to create collection directory: {0}")]
    CollectionDirCreation(std::io::Error),
    #[error("failed to read stored document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write stored document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialise document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise document: {0}")]
    Deserialization(serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
