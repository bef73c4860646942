//! # Chartstore Archive
//!
//! Encrypted archive codec and export/import pipeline for chartstore data.
//!
//! An archive is a single password-protected zip file holding one JSON
//! member per stored document revision, keyed `<collection>/<_id>.json`.
//! Members are canonical JSON, deflate-compressed, and AES-256 encrypted
//! (WinZip AES). Reading an archive decrypts and fully reads every member
//! before decoding any JSON, so a wrong password or structural damage
//! surfaces as [`ArchiveError::InvalidArchive`] rather than as partial data.

pub mod archive;
pub mod transfer;

pub use archive::Archive;
pub use transfer::{export_collection, export_store, import_archive, RestoreMode};

use std::path::PathBuf;

use chartstore_core::StoreError;

/// Errors raised while encoding, decoding, or transferring archives.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive does not exist: {0}")]
    ArchiveNotFound(PathBuf),
    #[error("archive already exists: {0}")]
    AlreadyExists(PathBuf),
    /// The file is not a readable archive: wrong password, truncation, or
    /// content that fails the integrity pass or does not decode as
    /// documents.
    #[error("invalid archive or password: {0}")]
    InvalidArchive(String),
    /// An entry path does not have the `<collection>/<_id>.json` shape.
    #[error("invalid archive entry path: {0}")]
    InvalidEntryPath(String),
    #[error("failed to open archive file: {0}")]
    ArchiveOpen(std::io::Error),
    #[error("failed to create archive file: {0}")]
    ArchiveCreate(std::io::Error),
    #[error("failed to create archive directory: {0}")]
    ArchiveDirCreation(std::io::Error),
    #[error("failed to write archive entry: {0}")]
    EntryWrite(zip::result::ZipError),
    #[error("failed to finish archive: {0}")]
    ArchiveFinish(zip::result::ZipError),
    #[error("failed to decode archive entry: {0}")]
    EntryDecode(serde_json::Error),
    #[error("failed to list data directory: {0}")]
    DataDirRead(std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
