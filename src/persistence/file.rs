//! Directory-backed key-value store for native builds
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temp file first and
//! are renamed into place, so a reader sees either the old or the new blob.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            let reason = format!("{}: {e}", dir.display());
            return Err(StorageError::Unavailable(reason));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut result = write_synced(&tmp, value);
        if result.is_ok() {
            result = fs::rename(&tmp, path);
        }
        if result.is_err() {
            // Never leave a half-written blob next to the real one
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

fn write_synced(path: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        self.write_atomic(&path, value).map_err(|e| {
            if e.kind() == io::ErrorKind::StorageFull {
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                }
            } else {
                StorageError::Write {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "pw_characters_v1";

    #[test]
    fn test_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get(KEY).unwrap(), None);
        store.set(KEY, "[]").unwrap();
        store.set(KEY, "[1]").unwrap();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("[1]"));
        assert!(!dir.path().join("pw_characters_v1.json.tmp").exists());

        store.remove(KEY).unwrap();
        store.remove(KEY).unwrap();
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        // A non-empty directory where the blob belongs makes the rename fail
        let blocker = dir.path().join("pw_characters_v1.json");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let err = store.set(KEY, "[]").unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(!dir.path().join("pw_characters_v1.json.tmp").exists());
    }

    #[test]
    fn test_key_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
