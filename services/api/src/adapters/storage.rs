//! services/api/src/adapters/storage.rs
//!
//! A file-backed implementation of the `KeyValueStore` port. Each key is kept
//! in its own `<key>.json` file under the data directory, and every write
//! goes through a temporary file and a rename so a crash never leaves a
//! half-written value behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use study_guide_core::ports::{KeyValueStore, StorageError, StorageResult};

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store, creating `dir` if it does not exist yet.
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, String> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(format!("'{}' is not a valid storage key", key));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let read_error = |message: String| StorageError::Read {
            key: key.to_string(),
            message,
        };
        let path = self.path_for(key).map_err(read_error)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_error(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_error = |message: String| StorageError::Write {
            key: key.to_string(),
            message,
        };
        let path = self.path_for(key).map_err(write_error)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| write_error(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| write_error(e.to_string()))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let write_error = |message: String| StorageError::Write {
            key: key.to_string(),
            message,
        };
        let path = self.path_for(key).map_err(write_error)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(write_error(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening_the_store() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path())
            .unwrap()
            .set("studyHistory", "[1,2,3]")
            .unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("studyHistory").unwrap().as_deref(), Some("[1,2,3]"));
        assert!(!dir.path().join("studyHistory.json.tmp").exists());
    }

    #[test]
    fn missing_keys_read_as_none_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        assert_eq!(store.get("theme").unwrap(), None);

        store.set("theme", "\"dark\"").unwrap();
        store.remove("theme").unwrap();
        store.remove("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn keys_cannot_escape_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../outside", "x"),
            Err(StorageError::Write { .. })
        ));
        assert!(matches!(store.get(""), Err(StorageError::Read { .. })));
    }
}
