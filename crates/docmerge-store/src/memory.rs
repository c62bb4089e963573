use std::collections::{BTreeMap, BTreeSet};

use docmerge_model::Document;

use crate::id::{generate_id, validate_id};
use crate::{retitled, DocumentStore, StoreError, StoreResult};

#[derive(Clone, Debug)]
struct Entry {
    folder: Option<String>,
    document: Document,
}

/// In-process store with the same id and folder rules as [`crate::FsStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, Entry>,
    folders: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_folder(&mut self, folder: &str) -> StoreResult<()> {
        validate_id(folder)?;
        self.folders.insert(folder.to_string());
        Ok(())
    }

    /// Stores `document` under a caller-chosen id, replacing any previous one.
    pub fn insert(&mut self, id: &str, document: Document) -> StoreResult<()> {
        validate_id(id)?;
        self.documents.insert(
            id.to_string(),
            Entry {
                folder: None,
                document,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn entry(&self, id: &str) -> StoreResult<&Entry> {
        validate_id(id)?;
        self.documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn entry_mut(&mut self, id: &str) -> StoreResult<&mut Entry> {
        validate_id(id)?;
        self.documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn open(&self, id: &str) -> StoreResult<Document> {
        Ok(self.entry(id)?.document.clone())
    }

    fn create(&mut self, title: &str, document: &Document) -> StoreResult<String> {
        let id = generate_id(title, |candidate| self.documents.contains_key(candidate));
        self.documents.insert(
            id.clone(),
            Entry {
                folder: None,
                document: retitled(document, title),
            },
        );
        Ok(id)
    }

    fn make_copy(&mut self, id: &str, title: &str) -> StoreResult<String> {
        let source = self.open(id)?;
        self.create(title, &source)
    }

    fn save(&mut self, id: &str, document: &Document) -> StoreResult<()> {
        self.entry_mut(id)?.document = document.clone();
        Ok(())
    }

    fn move_to_folder(&mut self, id: &str, folder: &str) -> StoreResult<()> {
        if folder.is_empty() {
            return Ok(());
        }
        validate_id(folder)?;
        if !self.folders.contains(folder) {
            return Err(StoreError::FolderNotFound(folder.to_string()));
        }
        self.entry_mut(id)?.folder = Some(folder.to_string());
        Ok(())
    }

    fn folder_of(&self, id: &str) -> StoreResult<Option<String>> {
        Ok(self.entry(id)?.folder.clone())
    }
}
