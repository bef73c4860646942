//! # Chartstore Core
//!
//! Versioned storage for clinical record documents.
//!
//! Every document is a JSON object carrying an envelope (`_id`, `_rev`,
//! `_type`, optional `_set_id`). Writes never overwrite: each accepted write
//! appends a new revision to an identity's chain, and optimistic concurrency
//! turns racing writes into [`StoreError::RevisionConflict`] instead of lost
//! updates. This crate contains:
//! - the document model and envelope accessors
//! - the [`backing::RevisionStore`] contract with filesystem and in-memory
//!   backings
//! - the singleton/set operations in [`store`]
//! - shallow-merge backfill helpers in [`merge`]
//! - revision grouping and collapse in [`collapse`]
//! - per-kind convenience modules in [`records`]
//!
//! **No API concerns**: authentication and service interfaces belong to the
//! binaries built on top of this crate.

pub mod backing;
pub mod collapse;
pub mod document;
pub mod error;
pub mod merge;
pub mod records;
pub mod store;

pub use backing::{FsCollection, InsertOutcome, MemoryCollection, RevisionStore};
pub use document::{
    Document, Identity, Revision, ID_FIELD, REV_FIELD, SET_ID_FIELD, TYPE_FIELD,
};
pub use error::{StoreError, StoreResult};

pub use chartstore_ident::RecordId;
pub use chartstore_types::{CollectionName, DocumentType};
