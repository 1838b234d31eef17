//! Resolving a submitted source reference to a local file.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Whether `source` is an `http(s)` URL.
pub fn is_remote_source(source: &str) -> bool {
    (source.starts_with("http://") || source.starts_with("https://")) && Url::parse(source).is_ok()
}

/// File name a source should be stored under.
pub fn source_file_name(source: &str) -> String {
    let name = if is_remote_source(source) {
        Url::parse(source)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .unwrap_or_default()
    } else {
        Path::new(source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    if name.is_empty() {
        "media".to_string()
    } else {
        name
    }
}

/// A source resolved to a local file.
///
/// Fetched sources live in a private scratch directory that is removed
/// when this is dropped. Local paths are left alone.
#[derive(Debug)]
pub struct LocalSource {
    path: PathBuf,
    scratch: Option<TempDir>,
}

impl LocalSource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_fetched(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Make `source` available as a local file.
///
/// URLs are fetched into a fresh directory under `work_dir`, so
/// concurrent fetches of equally named files never share a path. Local
/// paths must exist and are returned unchanged.
pub async fn fetch_source(
    http: &reqwest::Client,
    source: &str,
    work_dir: &Path,
) -> StorageResult<LocalSource> {
    if !is_remote_source(source) {
        let path = PathBuf::from(source);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StorageError::not_found(source));
        }
        return Ok(LocalSource {
            path,
            scratch: None,
        });
    }

    let mut response = http
        .get(source)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| StorageError::fetch_failed(e.to_string()))?;

    tokio::fs::create_dir_all(work_dir).await?;
    let scratch = tempfile::Builder::new()
        .prefix("fetch-")
        .tempdir_in(work_dir)?;
    let dest = scratch.path().join(source_file_name(source));
    debug!("Fetching {} to {}", source, dest.display());

    let mut file = tokio::fs::File::create(&dest).await?;
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    info!("Fetched {} ({} bytes)", source, written);
    Ok(LocalSource {
        path: dest,
        scratch: Some(scratch),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_is_remote_source() {
        assert!(is_remote_source("https://cdn.example.com/a.mov"));
        assert!(!is_remote_source("/var/media/a.mov"));
        assert!(!is_remote_source("ftp://example.com/a.mov"));
    }

    #[test]
    fn test_source_file_name() {
        assert_eq!(source_file_name("https://x.test/v/clip.mov?sig=1"), "clip.mov");
        assert_eq!(source_file_name("/var/media/b.mp4"), "b.mp4");
        assert_eq!(source_file_name("https://x.test/"), "media");
    }

    #[tokio::test]
    async fn test_fetch_remote_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/clip.mov"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"movie".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/media/clip.mov", server.uri());
        let local = fetch_source(&reqwest::Client::new(), &url, dir.path())
            .await
            .unwrap();
        assert!(local.is_fetched());
        assert!(local.path().starts_with(dir.path()));
        assert_eq!(local.path().file_name().unwrap(), "clip.mov");
        assert_eq!(tokio::fs::read(local.path()).await.unwrap(), b"movie");

        let scratch = local.path().parent().unwrap().to_path_buf();
        drop(local);
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_of_same_name_stay_apart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AAAA".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BBBB".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let http = reqwest::Client::new();
        let url_a = format!("{}/a/video.mp4", server.uri());
        let url_b = format!("{}/b/video.mp4", server.uri());
        let (a, b) = tokio::join!(
            fetch_source(&http, &url_a, dir.path()),
            fetch_source(&http, &url_b, dir.path())
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.path(), b.path());
        assert_eq!(tokio::fs::read(a.path()).await.unwrap(), b"AAAA");
        assert_eq!(tokio::fs::read(b.path()).await.unwrap(), b"BBBB");

        drop(a);
        assert_eq!(tokio::fs::read(b.path()).await.unwrap(), b"BBBB");
    }

    #[tokio::test]
    async fn test_fetch_remote_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.mov", server.uri());
        let err = fetch_source(&reqwest::Client::new(), &url, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_local_source_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("here.mov");
        std::fs::write(&file, b"x").unwrap();
        let local = fetch_source(&reqwest::Client::new(), file.to_str().unwrap(), dir.path())
            .await
            .unwrap();
        assert!(!local.is_fetched());
        assert_eq!(local.path(), file.as_path());
        drop(local);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_missing_local_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.mov");
        let err = fetch_source(&reqwest::Client::new(), missing.to_str().unwrap(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
