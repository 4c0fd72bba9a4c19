//! Attachment blob storage.
//!
//! Attachments are written under opaque keys of the form
//! `{uuid}/{sanitized-filename}`. [`LocalBlobStore`] keeps them on disk under
//! a root directory and serves them from a public URL prefix.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Maximum length of a sanitized filename, in characters.
pub const MAX_FILENAME_CHARS: usize = 120;

/// Filename used when the uploaded name has no usable characters.
pub const FALLBACK_FILENAME: &str = "file";

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A place attachment bytes live.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing blob.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError>;

    /// Remove the blob at `key`. Missing blobs are not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Public URL for `key`.
    fn url_for(&self, key: &str) -> String;
}

/// Strip path components and unsafe characters from an uploaded filename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// A fresh storage key for an upload named `filename`.
pub fn generate_storage_key(filename: &str) -> String {
    format!("{}/{}", uuid::Uuid::new_v4(), sanitize_filename(filename))
}

/// Reject keys that could escape the storage root.
fn checked_relative(key: &str) -> Result<&Path, BlobError> {
    let path = Path::new(key);
    let ok = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(path)
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

/// Filesystem-backed [`BlobStore`].
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_path: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        Ok(self.root.join(checked_relative(key)?))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        // Upload directories hold one file each.
        if let Some(parent) = path.parent() {
            if parent != self.root {
                let _ = tokio::fs::remove_dir(parent).await;
            }
        }
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_path, key)
    }
}
