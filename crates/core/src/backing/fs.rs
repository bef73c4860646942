//! Filesystem-backed collection.
//!
//! One directory per collection. Singleton chains store each revision
//! directly under the document type directory; set chains add one
//! subdirectory per set element:
//!
//! ```text
//! <collection>/
//! ├── valuesInventory/            # singleton chain
//! │   ├── 00000001.json
//! │   └── 00000002.json
//! └── assessment/                 # set kind
//!     ├── <set_id>/               # one chain per element
//!     │   ├── 00000001.json
//!     │   └── 00000002.json
//!     └── <set_id>/
//!         └── 00000001.json
//! ```
//!
//! Revision file names are the zero-padded revision number, so the
//! (`_type`, `_set_id`, `_rev`) uniqueness key *is* the file path. The atomic
//! insert-if-absent is a write to a hidden temporary file followed by
//! `hard_link` to the final name: the link either creates the path with its
//! content already complete, or fails with `AlreadyExists`, in which case
//! another writer won the revision. Concurrent readers never observe a
//! partially written revision file.

use super::{InsertOutcome, RevisionStore};
use crate::document::{Document, Identity, Revision};
use crate::error::{StoreError, StoreResult};
use chartstore_ident::RecordId;
use chartstore_types::DocumentType;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const REVISION_FILE_SUFFIX: &str = ".json";
const TEMP_FILE_PREFIX: &str = ".tmp-";

/// A collection stored as a directory of revision files.
///
/// The handle is cheap and stateless; any number of handles (including in
/// other processes) may operate on the same directory concurrently. The only
/// coordination point is the atomic create of each revision file.
#[derive(Debug)]
pub struct FsCollection {
    root: PathBuf,
}

impl FsCollection {
    /// Creates the collection directory (and any missing parents) and returns
    /// a handle to it. Succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionDirCreation` on I/O failure.
    pub fn create(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root).map_err(StoreError::CollectionDirCreation)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Opens an existing collection directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidCollectionDir` if the path does not exist
    /// or is not a directory.
    pub fn open(root: &Path) -> StoreResult<Self> {
        if !root.is_dir() {
            return Err(StoreError::InvalidCollectionDir(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The collection's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_dir(&self, identity: &Identity) -> PathBuf {
        let mut dir = self.root.join(identity.document_type().as_str());
        if let Some(set_id) = identity.set_id() {
            dir.push(set_id.as_str());
        }
        dir
    }

    fn revision_file_name(revision: Revision) -> String {
        format!("{:08}{}", revision.get(), REVISION_FILE_SUFFIX)
    }

    fn parse_revision_file_name(name: &str) -> Option<Revision> {
        let stem = name.strip_suffix(REVISION_FILE_SUFFIX)?;
        if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let raw: u64 = stem.parse().ok()?;
        Revision::new(raw).ok()
    }

    fn read_document(path: &Path) -> StoreResult<Document> {
        let bytes = fs::read(path).map_err(StoreError::FileRead)?;
        let document: Document =
            serde_json::from_slice(&bytes).map_err(StoreError::Deserialization)?;
        document.validate_stored()?;
        Ok(document)
    }

    /// Directory entries sorted by file name, for deterministic scans.
    fn sorted_entries(dir: &Path) -> StoreResult<Vec<fs::DirEntry>> {
        let mut entries = fs::read_dir(dir)
            .map_err(StoreError::FileRead)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::FileRead)?;
        entries.sort_by_key(|entry| entry.file_name());
        Ok(entries)
    }

    /// The revisions present in one chain directory, ascending.
    fn chain_revisions(dir: &Path) -> StoreResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(revisions),
            Err(e) => return Err(StoreError::FileRead(e)),
        };
        for entry in entries {
            let entry = entry.map_err(StoreError::FileRead)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if entry.path().is_dir() || name.starts_with(TEMP_FILE_PREFIX) {
                continue;
            }
            match Self::parse_revision_file_name(&name) {
                Some(revision) => revisions.push(revision),
                None => {
                    tracing::warn!(
                        "ignoring foreign file in collection chain: {}",
                        entry.path().display()
                    );
                }
            }
        }
        revisions.sort();
        Ok(revisions)
    }
}

impl RevisionStore for FsCollection {
    fn insert_unique(&self, document: Document) -> StoreResult<InsertOutcome> {
        document.validate_stored()?;
        let identity = document.identity()?;
        let revision = document.rev()?.ok_or_else(|| {
            StoreError::InvalidEnvelope("insert requires a revision number".into())
        })?;
        let id = document
            .id()?
            .ok_or_else(|| StoreError::InvalidEnvelope("insert requires an identifier".into()))?;

        let dir = self.identity_dir(&identity);
        fs::create_dir_all(&dir).map_err(StoreError::CollectionDirCreation)?;

        let temp_path = dir.join(format!("{TEMP_FILE_PREFIX}{id}"));
        fs::write(&temp_path, document.canonical_bytes()?).map_err(StoreError::FileWrite)?;

        let final_path = dir.join(Self::revision_file_name(revision));
        let outcome = match fs::hard_link(&temp_path, &final_path) {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(
                    "duplicate revision {} for {} lost the insert race",
                    revision,
                    identity
                );
                Ok(InsertOutcome::DuplicateRevision)
            }
            Err(e) => Err(StoreError::FileWrite(e)),
        };
        // The link (when it succeeded) owns the content now; the temp name is
        // always discarded.
        let _ = fs::remove_file(&temp_path);
        outcome
    }

    fn current(&self, identity: &Identity) -> StoreResult<Option<Document>> {
        let dir = self.identity_dir(identity);
        let revisions = Self::chain_revisions(&dir)?;
        match revisions.last() {
            Some(revision) => {
                Self::read_document(&dir.join(Self::revision_file_name(*revision))).map(Some)
            }
            None => Ok(None),
        }
    }

    fn current_set(&self, document_type: &DocumentType) -> StoreResult<Vec<Document>> {
        let type_dir = self.root.join(document_type.as_str());
        if !type_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in Self::sorted_entries(&type_dir)? {
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let set_id = match RecordId::parse(&name) {
                Ok(set_id) => set_id,
                Err(_) => {
                    tracing::warn!(
                        "ignoring foreign directory in collection: {}",
                        entry.path().display()
                    );
                    continue;
                }
            };
            let identity = Identity::set_element(document_type.clone(), set_id);
            if let Some(document) = self.current(&identity)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    fn at_revision(
        &self,
        identity: &Identity,
        revision: Revision,
    ) -> StoreResult<Option<Document>> {
        let path = self
            .identity_dir(identity)
            .join(Self::revision_file_name(revision));
        match fs::read(&path) {
            Ok(bytes) => {
                let document: Document =
                    serde_json::from_slice(&bytes).map_err(StoreError::Deserialization)?;
                document.validate_stored()?;
                Ok(Some(document))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::FileRead(e)),
        }
    }

    fn all_documents(&self) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        for type_entry in Self::sorted_entries(&self.root)? {
            let type_dir = type_entry.path();
            if !type_dir.is_dir() {
                tracing::warn!(
                    "ignoring foreign file in collection root: {}",
                    type_dir.display()
                );
                continue;
            }

            // Singleton revisions live directly in the type directory.
            for revision in Self::chain_revisions(&type_dir)? {
                documents.push(Self::read_document(
                    &type_dir.join(Self::revision_file_name(revision)),
                )?);
            }

            // Set element chains are one level deeper.
            for chain_entry in Self::sorted_entries(&type_dir)? {
                let chain_dir = chain_entry.path();
                if !chain_dir.is_dir() {
                    continue;
                }
                for revision in Self::chain_revisions(&chain_dir)? {
                    documents.push(Self::read_document(
                        &chain_dir.join(Self::revision_file_name(revision)),
                    )?);
                }
            }
        }
        Ok(documents)
    }
}
