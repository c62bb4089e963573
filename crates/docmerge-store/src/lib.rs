//! Storage collaborators for docmerge.
//!
//! Documents are addressed by opaque string ids and may be filed under a
//! folder. Every backend implements [`DocumentStore`].

mod fs;
mod id;
mod memory;

use std::io;
use std::path::PathBuf;

use docmerge_model::Document;
use thiserror::Error;

pub use fs::{write_atomic, FsStore};
pub use id::{generate_id, validate_id};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{0}' not found")]
    NotFound(String),

    #[error("folder '{0}' not found")]
    FolderNotFound(String),

    #[error("invalid id '{0}': expected letters, digits, '-' or '_'")]
    InvalidId(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// True when the error names an id or folder that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::FolderNotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait DocumentStore {
    fn open(&self, id: &str) -> StoreResult<Document>;

    /// Stores `document` under `title` and returns the new id.
    fn create(&mut self, title: &str, document: &Document) -> StoreResult<String>;

    /// Duplicates an existing document under a new title.
    fn make_copy(&mut self, id: &str, title: &str) -> StoreResult<String>;

    /// Overwrites an existing document.
    fn save(&mut self, id: &str, document: &Document) -> StoreResult<()>;

    /// Files the document under `folder`. An empty folder id leaves it in place.
    fn move_to_folder(&mut self, id: &str, folder: &str) -> StoreResult<()>;

    /// Folder currently holding the document, `None` for the root.
    fn folder_of(&self, id: &str) -> StoreResult<Option<String>>;
}

pub(crate) fn retitled(document: &Document, title: &str) -> Document {
    let mut copy = document.clone();
    copy.title = title.to_string();
    copy
}
