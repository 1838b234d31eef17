//! Object storage on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::naming::unique_object_name;
use crate::storage::{Container, ObjectStorage};

/// Stores objects as files under `<root>/<container>/<name>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, name: &str, container: Container) -> PathBuf {
        self.root.join(container.as_str()).join(name)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        container: Container,
    ) -> StorageResult<String> {
        let name = unique_object_name(desired_name)?;
        let target = self.object_path(&name, container);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", local_path.display(), e)))?;
        debug!("Stored {} as {}", local_path.display(), target.display());
        Ok(name)
    }

    async fn download(&self, name: &str, container: Container, dest: &Path) -> StorageResult<PathBuf> {
        let source = self.object_path(name, container);
        if !tokio::fs::try_exists(&source).await? {
            return Err(StorageError::not_found(format!("{}/{}", container, name)));
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, dest).await?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path().join("objects"));
        let input = dir.path().join("clip.mov");
        tokio::fs::write(&input, b"media").await.unwrap();

        let name = storage
            .upload(&input, "clip.mov", Container::Source)
            .await
            .unwrap();
        assert!(name.starts_with("clip-") && name.ends_with(".mov"));

        let dest = dir.path().join("work").join("copy.mov");
        storage.download(&name, Container::Source, &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"media");
    }

    #[tokio::test]
    async fn test_download_from_wrong_container_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());
        let input = dir.path().join("a.mp4");
        tokio::fs::write(&input, b"x").await.unwrap();
        let name = storage
            .upload(&input, "a.mp4", Container::Transcoded)
            .await
            .unwrap();

        let err = storage
            .download(&name, Container::Source, &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path());
        let err = storage
            .upload(&dir.path().join("nope.mov"), "nope.mov", Container::Source)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
    }
}
