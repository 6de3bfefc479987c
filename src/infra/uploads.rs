//! Filesystem-backed blob store for post images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

use crate::application::repos::{BlobStore, RepoError};

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path `{0}`")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<UploadStorageError> for RepoError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::InvalidPath(path) => RepoError::InvalidInput {
                message: format!("invalid object key `{path}`"),
            },
            UploadStorageError::Io(io) => RepoError::from_persistence(io),
        }
    }
}

/// Objects are plain files under `root`, one directory per bucket.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the payload, refusing to replace an existing object.
    pub async fn store(&self, key: &str, data: &[u8]) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(key)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute)
            .await?;
        if let Err(err) = file.write_all(data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Option<Bytes>, UploadStorageError> {
        let absolute = self.resolve(key)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the stored payload. Missing files are treated as success.
    pub async fn delete(&self, key: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(key)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(key);
        let escapes = relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            });
        if key.is_empty() || escapes {
            return Err(UploadStorageError::InvalidPath(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for UploadStorage {
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), RepoError> {
        self.store(key, &data).await.map_err(RepoError::from)
    }

    async fn get_object(&self, key: &str) -> Result<Option<Bytes>, RepoError> {
        self.read(key).await.map_err(RepoError::from)
    }

    async fn delete_object(&self, key: &str) -> Result<(), RepoError> {
        self.delete(key).await.map_err(RepoError::from)
    }
}
