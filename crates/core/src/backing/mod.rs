//! Backing store contract and implementations.
//!
//! A collection is one logical record-set (one patient or provider). The
//! store's only safety mechanism is the backing's atomic, uniqueness-enforcing
//! insert on the (`_type`, `_set_id`, `_rev`) key: there is no in-process
//! lock, no cross-operation transaction, and no blocking. A losing writer is
//! told immediately via [`InsertOutcome::DuplicateRevision`], never queued or
//! retried.
//!
//! Any store satisfying this contract is substitutable — a filesystem
//! directory with create-if-absent semantics ([`FsCollection`]), an in-memory
//! map ([`MemoryCollection`]), a key-value store with conditional put, or a
//! document database with a uniqueness index.

mod fs;
mod memory;

pub use fs::FsCollection;
pub use memory::MemoryCollection;

use crate::document::{Document, Identity, Revision};
use crate::error::StoreResult;
use chartstore_types::DocumentType;

/// Result of an insert-if-absent attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The document was stored; it is now part of its identity's chain.
    Inserted,
    /// A document with the same (`_type`, `_set_id`, `_rev`) key already
    /// exists. The revision chain is unchanged.
    DuplicateRevision,
}

/// One collection of revision-chained documents.
///
/// Implementations must make [`insert_unique`](RevisionStore::insert_unique)
/// atomic with respect to concurrent callers: for two simultaneous inserts of
/// the same (`_type`, `_set_id`, `_rev`) key, exactly one observes
/// [`InsertOutcome::Inserted`] and the other
/// [`InsertOutcome::DuplicateRevision`] — never two winners.
///
/// Documents handed to `insert_unique` carry a complete stored envelope
/// (`_id`, `_rev`, `_type`, and `_set_id` for set elements); the collection
/// store operations in [`crate::store`] guarantee this.
pub trait RevisionStore {
    /// Insert-if-absent on the unique (`_type`, `_set_id`, `_rev`) key.
    fn insert_unique(&self, document: Document) -> StoreResult<InsertOutcome>;

    /// The current (maximum-`_rev`) document for an identity, if any revision
    /// has ever been accepted for it.
    fn current(&self, identity: &Identity) -> StoreResult<Option<Document>>;

    /// The current document for every distinct `_set_id` under a set kind.
    ///
    /// Order is unspecified at this layer; [`crate::store::get_set`] sorts.
    fn current_set(&self, document_type: &DocumentType) -> StoreResult<Vec<Document>>;

    /// Point lookup of one historical revision.
    fn at_revision(&self, identity: &Identity, revision: Revision)
        -> StoreResult<Option<Document>>;

    /// Every stored document revision in the collection. Used by the export
    /// pipeline, which archives full history rather than current state.
    fn all_documents(&self) -> StoreResult<Vec<Document>>;
}
