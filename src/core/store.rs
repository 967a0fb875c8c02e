//! Key-value storage for named configurations
//!
//! Layout of a [`FileStore`] directory:
//! ```text
//! <root>/
//!   default.json   - configuration named "default"
//!   <name>.json    - any other named configuration
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Errors from configuration storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored configuration '{0}' is not a JSON object")]
    NotAnObject(String),
    #[error("invalid configuration name '{0}'")]
    InvalidName(String),
}

/// Storage addressed by configuration name.
pub trait ConfigStore {
    /// Read the serialized configuration stored under `name`, if any.
    fn read(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Store `contents` under `name`, replacing what was there.
    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError>;
}

/// In-process storage, lost when the session ends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(name).cloned())
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError> {
        self.entries.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

/// One JSON file per configuration name inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the store directory; it is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains('\0');
        if !valid {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

impl ConfigStore for FileStore {
    fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_read_write() {
        let mut store = MemoryStore::new();
        assert!(store.read("default").unwrap().is_none());

        store.write("default", "{}").unwrap();
        assert_eq!(store.read("default").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_creates_directory_on_write() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(tmp.path().join("saves"));

        assert!(store.read("default").unwrap().is_none());
        store.write("default", "{\"gravity\": 9.8}").unwrap();

        assert!(store.root().join("default.json").is_file());
        assert_eq!(
            store.read("default").unwrap().as_deref(),
            Some("{\"gravity\": 9.8}")
        );
    }

    #[test]
    fn test_file_store_rejects_path_names() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(tmp.path());

        for name in ["", "..", "../escape", "a/b", "a\\b"] {
            assert!(matches!(
                store.write(name, "{}"),
                Err(StoreError::InvalidName(_))
            ));
        }
    }
}
