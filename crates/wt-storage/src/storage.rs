//! Object storage abstraction.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StorageResult;

/// Logical container an object lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// Uploaded source media
    Source,
    /// Transcoder output
    Transcoded,
}

impl Container {
    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Source => "media-source",
            Container::Transcoded => "media-transcoding",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blob storage addressed by object name within a container.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file.
    ///
    /// The stored name is `desired_name` with a uniqueness suffix and is
    /// returned to the caller.
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        container: Container,
    ) -> StorageResult<String>;

    /// Download an object into `dest`, creating parent directories.
    async fn download(&self, name: &str, container: Container, dest: &Path) -> StorageResult<PathBuf>;
}
