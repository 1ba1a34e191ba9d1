//! Directory-backed key-value store.
//!
//! Each slot is a file `<dir>/<name>.json`. Writes go through
//! [`crate::fs::write_atomic`], so a failed write never leaves a torn value.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::storage::traits::KeyValueStore;

/// Key-value store keeping one file per slot in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Storage` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            VaultError::Storage(format!(
                "Cannot create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `name`.
    pub fn slot_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(VaultError::InvalidInput(format!(
                "Invalid slot name: {:?}",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.slot_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::Storage(format!(
                "Read {} failed: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&mut self, name: &str, value: &[u8]) -> Result<()> {
        let path = self.slot_path(name)?;
        crate::fs::write_atomic(&path, value).map_err(|e| {
            VaultError::Storage(format!("Write {} failed: {}", path.display(), e))
        })
    }
}
