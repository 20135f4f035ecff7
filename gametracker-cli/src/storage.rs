//! Key/value persistence. Every key holds one JSON document.
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const PLAYED_KEY: &str = "gameTrackerPro_playedGames";
pub const BACKLOG_KEY: &str = "gameTrackerPro_backlogGames";
pub const VIEW_KEY: &str = "gameTrackerPro_view";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("cannot access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid data stored under {key}: {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },
}

/// Serializes `value` for storage under `key`.
pub fn to_json<T: Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Json {
        key: key.to_string(),
        source,
    })
}

pub trait Storage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores every entry, or none of them when a write fails.
    fn save_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.save_all(&[(key, value.to_string())])
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        Self: Sized,
    {
        self.load(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StorageError::Json {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn save_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let raw = to_json(key, value)?;
        self.save(key, &raw)
    }
}

/// Stores each key as `<key>.json` inside a directory. The directory is
/// created on the first write.
///
/// A save writes every entry to a temporary file first and only renames them
/// into place once all writes succeeded.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                trace!(path = %path.display(), bytes = raw.len(), "Loaded");
                Ok(Some(raw))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let tmp = self.dir.join(format!("{key}.json.tmp"));
            if let Err(source) = std::fs::write(&tmp, value) {
                for (written, _) in &staged {
                    // Best effort; a stale temp file is overwritten next time.
                    let _ = std::fs::remove_file(written);
                }
                return Err(StorageError::Io { path: tmp, source });
            }
            staged.push((tmp, self.path(key)));
        }

        for (tmp, path) in staged {
            std::fs::rename(&tmp, &path).map_err(io_err(&path))?;
            trace!(path = %path.display(), "Saved");
        }
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load(PLAYED_KEY).unwrap(), None);

        storage.save(PLAYED_KEY, "[1,2]").unwrap();
        storage.save(PLAYED_KEY, "[3]").unwrap();
        assert_eq!(storage.load(PLAYED_KEY).unwrap().as_deref(), Some("[3]"));
        assert!(dir
            .path()
            .join("nested")
            .join("gameTrackerPro_playedGames.json")
            .exists());
        assert!(!dir
            .path()
            .join("nested")
            .join("gameTrackerPro_playedGames.json.tmp")
            .exists());
    }

    #[test]
    fn failed_write_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.save(PLAYED_KEY, "[1]").unwrap();

        // A directory where the temp file should go makes that write fail.
        std::fs::create_dir(dir.path().join("gameTrackerPro_backlogGames.json.tmp")).unwrap();
        let err = storage
            .save_all(&[(PLAYED_KEY, "[2]".to_string()), (BACKLOG_KEY, "[3]".to_string())])
            .unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(storage.load(PLAYED_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.load(BACKLOG_KEY).unwrap(), None);
        assert!(!dir
            .path()
            .join("gameTrackerPro_playedGames.json.tmp")
            .exists());
    }

    #[test]
    fn json_helpers() {
        let mut storage = MemoryStorage::new();
        storage.save_json(VIEW_KEY, &vec!["a", "b"]).unwrap();
        assert_eq!(
            storage.load_json::<Vec<String>>(VIEW_KEY).unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(storage.load_json::<Vec<String>>(BACKLOG_KEY).unwrap(), None);
    }

    #[test]
    fn invalid_json_names_the_key() {
        let mut storage = MemoryStorage::new();
        storage.save(BACKLOG_KEY, "{not json").unwrap();
        let err = storage.load_json::<Vec<String>>(BACKLOG_KEY).unwrap_err();
        assert!(matches!(err, StorageError::Json { ref key, .. } if key == BACKLOG_KEY));
    }
}
