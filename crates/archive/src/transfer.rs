//! Export and import between a data directory and an archive.
//!
//! A data directory holds one subdirectory per collection, each managed by
//! [`FsCollection`]. Export walks every collection and captures every stored
//! revision; import recreates collections from an archive, either with full
//! history or collapsed to current documents only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chartstore_core::backing::{FsCollection, InsertOutcome, RevisionStore};
use chartstore_core::records::sentinel;
use chartstore_core::{Document, StoreError, ID_FIELD};
use chartstore_types::CollectionName;

use crate::{Archive, ArchiveError, ArchiveResult};

/// How an archive is replayed into a data directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreMode {
    /// Restore every revision of every document, reproducing the chains the
    /// archive captured.
    FullHistory,
    /// Restore only the winning revision of each identity. Sentinels are not
    /// copied from the archive; each restored collection gets a fresh one.
    CurrentOnly,
}

/// Captures every stored revision of one collection as archive entries.
pub fn export_collection<C: RevisionStore>(
    store: &C,
    collection: &CollectionName,
) -> ArchiveResult<BTreeMap<String, Document>> {
    let mut entries = BTreeMap::new();
    for document in store.all_documents()? {
        let id = document.id()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!("stored document is missing {ID_FIELD}"))
        })?;
        entries.insert(Archive::entry_path(collection, &id), document);
    }
    Ok(entries)
}

/// Builds an archive covering every collection directory under `root_dir`.
///
/// Directory entries that are not valid collection names are skipped with a
/// warning; regular files at the top level are ignored.
pub fn export_store(root_dir: &Path) -> ArchiveResult<Archive> {
    let mut archive = Archive::new();
    let listing = fs::read_dir(root_dir).map_err(ArchiveError::DataDirRead)?;
    for entry in listing {
        let entry = entry.map_err(ArchiveError::DataDirRead)?;
        let file_type = entry.file_type().map_err(ArchiveError::DataDirRead)?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let collection = match name.to_str().map(CollectionName::new) {
            Some(Ok(collection)) => collection,
            _ => {
                tracing::warn!(
                    "skipping non-collection directory {:?} during export",
                    name
                );
                continue;
            }
        };
        let store = FsCollection::open(&entry.path())?;
        for document in export_collection(&store, &collection)?.into_values() {
            archive.insert(&collection, document)?;
        }
    }
    Ok(archive)
}

/// Replays an archive into a data directory, one [`FsCollection`] per
/// archive collection.
///
/// # Errors
///
/// `StoreError::RevisionConflict` (via `ArchiveError::Store`) if a restored
/// revision already exists in the destination; the import stops at the first
/// such collision.
pub fn import_archive(
    archive: &Archive,
    root_dir: &Path,
    mode: RestoreMode,
) -> ArchiveResult<()> {
    for collection in archive.collections()? {
        let store = FsCollection::create(&root_dir.join(collection.as_str()))?;
        match mode {
            RestoreMode::FullHistory => {
                let entries = archive.collection_entries(&collection, false)?;
                for document in entries.into_values() {
                    restore_document(&store, document.clone())?;
                }
            }
            RestoreMode::CurrentOnly => {
                let entries = archive.collection_entries(&collection, true)?;
                let collapsed = Archive::collapse_entry_revisions(&entries)?;
                for document in collapsed.into_values() {
                    restore_document(&store, document.clone())?;
                }
                sentinel::ensure_sentinel(&store)?;
            }
        }
        tracing::debug!(collection = %collection, "collection restored");
    }
    Ok(())
}

/// Inserts one archived revision verbatim, envelope included.
fn restore_document<C: RevisionStore>(store: &C, document: Document) -> ArchiveResult<()> {
    let identity = document.identity()?;
    match store.insert_unique(document)? {
        InsertOutcome::Inserted => Ok(()),
        InsertOutcome::DuplicateRevision => {
            let current = store.current(&identity)?;
            Err(StoreError::RevisionConflict {
                identity,
                current: current.map(Box::new),
            }
            .into())
        }
    }
}
