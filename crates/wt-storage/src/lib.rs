//! Object storage for source and transcoded media.
//!
//! This crate provides:
//! - The [`ObjectStorage`] trait addressing blobs by opaque name and container
//! - An S3-compatible client and a local-directory implementation
//! - Object naming rules
//! - Fetching of URL sources to local files

pub mod config;
pub mod error;
pub mod local;
pub mod naming;
pub mod s3;
pub mod source;
pub mod storage;

pub use config::{build_storage, StorageBackend, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use local::LocalObjectStorage;
pub use naming::{transcoded_file_name, unique_object_name};
pub use s3::{S3Config, S3ObjectStorage};
pub use source::{fetch_source, is_remote_source, source_file_name, LocalSource};
pub use storage::{Container, ObjectStorage};
