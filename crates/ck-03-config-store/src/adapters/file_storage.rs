//! # File Storage
//!
//! One JSON file per key under a directory. Writers take an exclusive
//! `fs2` lock on a sidecar `.lock` file and replace the data file by
//! rename; readers take a shared lock.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::domain::errors::PersistenceError;
use crate::ports::outbound::Storage;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

/// Held lock on a key; released on drop.
struct KeyLock {
    file: File,
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_stem(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect()
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::file_stem(key)))
    }

    fn lock(&self, key: &str, exclusive: bool) -> Result<KeyLock, PersistenceError> {
        let path = self.dir.join(format!("{}.lock", Self::file_stem(key)));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| PersistenceError::Locked(format!("{}: {e}", path.display())))?;
        Ok(KeyLock { file })
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.data_path(key);
        let _lock = self.lock(key, false)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.data_path(key);
        let tmp = path.with_extension("json.tmp");
        let _lock = self.lock(key, true)?;

        let mut file = File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "Persisted item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.data_path(key);
        let _lock = self.lock(key, true)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
