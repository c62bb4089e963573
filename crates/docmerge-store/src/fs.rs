use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use docmerge_model::Document;
use log::debug;
use tempfile::Builder;
use walkdir::WalkDir;

use crate::id::{generate_id, validate_id};
use crate::{retitled, DocumentStore, StoreError, StoreResult};

const EXTENSION: &str = "json";

/// Documents as JSON files under a root directory.
///
/// Layout: `<root>/<id>.json` for unfiled documents and
/// `<root>/<folder>/<id>.json` for filed ones.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open_root(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| io_error(&root, source))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_folder(&self, folder: &str) -> StoreResult<PathBuf> {
        validate_id(folder)?;
        let path = self.root.join(folder);
        fs::create_dir_all(&path).map_err(|source| io_error(&path, source))?;
        Ok(path)
    }

    /// Path of the document file, searching the root and one folder level.
    pub fn path_of(&self, id: &str) -> StoreResult<PathBuf> {
        validate_id(id)?;
        let file_name = format!("{id}.{EXTENSION}");

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(2) {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(&self.root).to_path_buf();
                io_error(&path, err.into())
            })?;
            if entry.file_type().is_file() && entry.file_name() == file_name.as_str() {
                return Ok(entry.into_path());
            }
        }

        Err(StoreError::NotFound(id.to_string()))
    }

    fn contains(&self, id: &str) -> bool {
        self.path_of(id).is_ok()
    }

    fn write_document(&self, path: &Path, document: &Document) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(document).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &contents).map_err(|source| io_error(path, source))
    }

    fn insert(&self, title: &str, document: &Document) -> StoreResult<String> {
        let id = generate_id(title, |candidate| self.contains(candidate));
        let path = self.root.join(format!("{id}.{EXTENSION}"));
        self.write_document(&path, &retitled(document, title))?;
        debug!("stored document {id} at {}", path.display());
        Ok(id)
    }
}

impl DocumentStore for FsStore {
    fn open(&self, id: &str) -> StoreResult<Document> {
        let path = self.path_of(id)?;
        let contents = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
    }

    fn create(&mut self, title: &str, document: &Document) -> StoreResult<String> {
        self.insert(title, document)
    }

    fn make_copy(&mut self, id: &str, title: &str) -> StoreResult<String> {
        let source = self.open(id)?;
        self.insert(title, &source)
    }

    fn save(&mut self, id: &str, document: &Document) -> StoreResult<()> {
        let path = self.path_of(id)?;
        self.write_document(&path, document)
    }

    fn move_to_folder(&mut self, id: &str, folder: &str) -> StoreResult<()> {
        if folder.is_empty() {
            return Ok(());
        }
        validate_id(folder)?;
        let folder_path = self.root.join(folder);
        if !folder_path.is_dir() {
            return Err(StoreError::FolderNotFound(folder.to_string()));
        }

        let from = self.path_of(id)?;
        let to = folder_path.join(format!("{id}.{EXTENSION}"));
        if from != to {
            fs::rename(&from, &to).map_err(|source| io_error(&from, source))?;
            debug!("moved document {id} into folder {folder}");
        }
        Ok(())
    }

    fn folder_of(&self, id: &str) -> StoreResult<Option<String>> {
        let path = self.path_of(id)?;
        let folder = path
            .parent()
            .filter(|parent| *parent != self.root.as_path())
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        Ok(folder)
    }
}

/// Writes `contents` to `path` through a sibling temp file so readers never
/// observe a partial document.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new().prefix(".docmerge").tempfile_in(&parent)?;
    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_replaces_contents_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn lookup_ignores_deeper_levels() {
        let dir = tempdir().unwrap();
        let store = FsStore::open_root(dir.path()).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.json"), "{}").unwrap();

        assert!(matches!(store.path_of("deep"), Err(StoreError::NotFound(_))));
    }
}
