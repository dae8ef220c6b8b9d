//! File storage for uploaded assets.
//!
//! Objects live on disk under `STORAGE_DIR/<bucket>/<key>`. Only keys under
//! `images/` are accessible; any signed-in user may read, write and delete
//! them. Nothing in the views uses this yet. Reads are served from disk
//! by `tower-http`; this module only validates keys and handles writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::frame::ErrorCode;

/// Bucket name; the directory created under the storage root.
pub const STORAGE_NAME: &str = "retro-games-4d1a";
pub const PUBLIC_PREFIX: &str = "images/";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("access denied for key: {0}")]
    Forbidden(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "E_INVALID_KEY",
            Self::Forbidden(_) => "E_FORBIDDEN",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Io(_) => "E_IO",
        }
    }
}

/// A validated object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(String);

impl StorageKey {
    /// Reject traversal and malformed keys, then apply the access rule.
    ///
    /// # Errors
    ///
    /// `InvalidKey` for empty, absolute or `..`/`.` containing keys;
    /// `Forbidden` for keys outside `images/`.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() || raw.starts_with('/') || raw.contains('\\') || raw.contains('\0') {
            return Err(StorageError::InvalidKey(raw.to_owned()));
        }
        if raw.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(StorageError::InvalidKey(raw.to_owned()));
        }
        if !raw.starts_with(PUBLIC_PREFIX) {
            return Err(StorageError::Forbidden(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(storage_dir: &Path) -> Self {
        Self { root: storage_dir.join(STORAGE_NAME) }
    }

    /// On-disk location of `key`. GET requests serve this file directly.
    #[must_use]
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Write (or overwrite) an object, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if a directory or the file cannot be
    /// written.
    pub async fn write(&self, key: &StorageKey, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(key = key.as_str(), size = bytes.len(), "storage: object written");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if there is no such object, or
    /// [`StorageError::Io`] if removal fails.
    pub async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        tokio::fs::remove_file(self.path_for(key)).await.map_err(|e| not_found_or_io(e, key))?;
        tracing::info!(key = key.as_str(), "storage: object deleted");
        Ok(())
    }
}

fn not_found_or_io(err: std::io::Error, key: &StorageKey) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.as_str().to_owned())
    } else {
        StorageError::Io(err)
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
