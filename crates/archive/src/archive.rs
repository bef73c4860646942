//! The archive container: an in-memory map of entries and its encrypted
//! on-disk encoding.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use chartstore_core::records::sentinel;
use chartstore_core::{Document, Identity, RecordId, Revision, StoreError, ID_FIELD};
use chartstore_types::CollectionName;
use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use crate::{ArchiveError, ArchiveResult};

const ENTRY_SUFFIX: &str = ".json";

/// A decoded archive: one document per entry, keyed
/// `<collection>/<_id>.json`.
///
/// Entries are held in a `BTreeMap`, so iteration order (and therefore the
/// member order of a written archive) is the lexicographic entry path order.
/// Accessors hand out shared references; an archive is only mutated through
/// [`Archive::insert`] and [`Archive::replace_collection_documents`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Archive {
    entries: BTreeMap<String, Document>,
}

impl Archive {
    /// Creates an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an encrypted archive file.
    ///
    /// Every member is decrypted and fully read before any JSON is decoded,
    /// so the per-member authentication data is verified for the whole file
    /// first. A wrong password, truncation, or a member that fails
    /// authentication is [`ArchiveError::InvalidArchive`].
    ///
    /// # Errors
    ///
    /// - `ArchiveError::ArchiveNotFound` if `path` does not exist.
    /// - `ArchiveError::InvalidArchive` if the file is not a readable
    ///   archive under `password`.
    /// - `ArchiveError::InvalidEntryPath` / `ArchiveError::EntryDecode` if a
    ///   member is not a well-formed document entry.
    pub fn read_archive(path: &Path, password: &str) -> ArchiveResult<Self> {
        let file = OpenOptions::new().read(true).open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ArchiveError::ArchiveNotFound(path.to_owned())
            } else {
                ArchiveError::ArchiveOpen(e)
            }
        })?;
        let mut zip = ZipArchive::new(file)
            .map_err(|e| ArchiveError::InvalidArchive(e.to_string()))?;

        // Integrity pass: decrypt and drain every member. AES members carry
        // an authentication code that is only checked on a full read.
        let mut raw: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for index in 0..zip.len() {
            let mut member = zip
                .by_index_decrypt(index, password.as_bytes())
                .map_err(|e| ArchiveError::InvalidArchive(e.to_string()))?;
            if member.is_dir() {
                continue;
            }
            let name = member.name().to_owned();
            let mut bytes = Vec::with_capacity(member.size() as usize);
            member
                .read_to_end(&mut bytes)
                .map_err(|e| ArchiveError::InvalidArchive(e.to_string()))?;
            raw.insert(name, bytes);
        }

        let mut archive = Self::new();
        for (entry_path, bytes) in raw {
            let (collection, file_name) = split_entry_path(&entry_path)?;
            let document: Document =
                serde_json::from_slice(&bytes).map_err(ArchiveError::EntryDecode)?;
            document.validate_stored()?;
            // The member name must agree with the document it holds.
            if document.id()?.map(|id| format!("{id}{ENTRY_SUFFIX}")) != Some(file_name.to_owned())
            {
                return Err(ArchiveError::InvalidEntryPath(entry_path));
            }
            archive.insert(&collection, document)?;
        }
        tracing::debug!(entries = archive.entries.len(), "archive decoded");
        Ok(archive)
    }

    /// Encodes this archive to an encrypted file.
    ///
    /// The destination is write-once; an existing file is never replaced.
    ///
    /// # Errors
    ///
    /// `ArchiveError::AlreadyExists` if `path` already exists.
    pub fn write_archive(&self, path: &Path, password: &str) -> ArchiveResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(ArchiveError::ArchiveDirCreation)?;
            }
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    ArchiveError::AlreadyExists(path.to_owned())
                } else {
                    ArchiveError::ArchiveCreate(e)
                }
            })?;

        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .with_aes_encryption(AesMode::Aes256, password);
        for (entry_path, document) in &self.entries {
            zip.start_file(entry_path.as_str(), options)
                .map_err(ArchiveError::EntryWrite)?;
            let bytes = document.canonical_bytes()?;
            zip.write_all(&bytes)
                .map_err(|e| ArchiveError::EntryWrite(e.into()))?;
        }
        zip.finish().map_err(ArchiveError::ArchiveFinish)?;
        tracing::debug!(entries = self.entries.len(), path = %path.display(), "archive written");
        Ok(())
    }

    /// All entries, keyed by entry path.
    pub fn entries(&self) -> &BTreeMap<String, Document> {
        &self.entries
    }

    /// Consumes the archive, yielding its entries.
    pub fn into_entries(self) -> BTreeMap<String, Document> {
        self.entries
    }

    /// Adds one document under a collection, keyed by its `_id`.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidEnvelope` (via `ArchiveError::Store`) if the
    /// document lacks a stored envelope.
    pub fn insert(&mut self, collection: &CollectionName, document: Document) -> ArchiveResult<()> {
        document.validate_stored()?;
        let id = document.id()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!("document is missing {ID_FIELD}"))
        })?;
        self.entries
            .insert(Self::entry_path(collection, &id), document);
        Ok(())
    }

    /// The collections present in this archive: every directory with at
    /// least one entry, in lexicographic order.
    pub fn collections(&self) -> ArchiveResult<Vec<CollectionName>> {
        let mut collections = Vec::new();
        for entry_path in self.entries.keys() {
            let (collection, _) = split_entry_path(entry_path)?;
            if collections.last() != Some(&collection) {
                collections.push(collection);
            }
        }
        Ok(collections)
    }

    /// All entries of one collection, optionally without its sentinel.
    pub fn collection_entries(
        &self,
        collection: &CollectionName,
        ignore_sentinel: bool,
    ) -> ArchiveResult<BTreeMap<&str, &Document>> {
        let mut selected = BTreeMap::new();
        for (entry_path, document) in &self.entries {
            let (entry_collection, _) = split_entry_path(entry_path)?;
            if &entry_collection != collection {
                continue;
            }
            if ignore_sentinel
                && document.document_type()?.map(|t| t.as_str() == sentinel::DOCUMENT_TYPE)
                    == Some(true)
            {
                continue;
            }
            selected.insert(entry_path.as_str(), document);
        }
        Ok(selected)
    }

    /// All documents of one collection (sentinel included), cloned out of
    /// the archive.
    pub fn collection_documents(
        &self,
        collection: &CollectionName,
    ) -> ArchiveResult<Vec<Document>> {
        Ok(self
            .collection_entries(collection, false)?
            .into_values()
            .cloned()
            .collect())
    }

    /// Reduces a set of entries to the winning revision per identity:
    /// maximum `_rev`, ties broken by the greatest `_id`.
    pub fn collapse_entry_revisions<'a>(
        entries: &BTreeMap<&'a str, &'a Document>,
    ) -> ArchiveResult<BTreeMap<&'a str, &'a Document>> {
        let mut winners: BTreeMap<Identity, (Revision, RecordId, &str, &Document)> =
            BTreeMap::new();
        for (&entry_path, &document) in entries {
            let identity = document.identity()?;
            let rev = document.rev()?.ok_or_else(|| {
                StoreError::InvalidEnvelope("archive entry is missing a revision".into())
            })?;
            let id = document.id()?.ok_or_else(|| {
                StoreError::InvalidEnvelope(format!("archive entry is missing {ID_FIELD}"))
            })?;
            match winners.get(&identity) {
                Some((best_rev, best_id, _, _)) if (*best_rev, best_id) >= (rev, &id) => {}
                _ => {
                    winners.insert(identity, (rev, id, entry_path, document));
                }
            }
        }
        Ok(winners
            .into_values()
            .map(|(_, _, entry_path, document)| (entry_path, document))
            .collect())
    }

    /// Replaces every entry of one collection with the given documents.
    pub fn replace_collection_documents(
        &mut self,
        collection: &CollectionName,
        documents: Vec<Document>,
    ) -> ArchiveResult<()> {
        let prefix = format!("{collection}/");
        self.entries.retain(|entry_path, _| !entry_path.starts_with(&prefix));
        for document in documents {
            self.insert(collection, document)?;
        }
        Ok(())
    }

    /// The entry path of one document revision within a collection.
    pub fn entry_path(collection: &CollectionName, id: &RecordId) -> String {
        format!("{collection}/{id}{ENTRY_SUFFIX}")
    }
}

/// Splits `<collection>/<_id>.json` into its collection and file name.
fn split_entry_path(entry_path: &str) -> ArchiveResult<(CollectionName, &str)> {
    let (collection, file_name) = entry_path
        .rsplit_once('/')
        .ok_or_else(|| ArchiveError::InvalidEntryPath(entry_path.to_owned()))?;
    if !file_name.ends_with(ENTRY_SUFFIX) {
        return Err(ArchiveError::InvalidEntryPath(entry_path.to_owned()));
    }
    let collection = CollectionName::new(collection)
        .map_err(|_| ArchiveError::InvalidEntryPath(entry_path.to_owned()))?;
    Ok((collection, file_name))
}
