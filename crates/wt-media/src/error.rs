//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    #[error("Failed to launch transcoder: {0}")]
    LaunchFailed(String),

    #[error("Failed to signal transcoder: {0}")]
    SignalFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn launch_failed(msg: impl Into<String>) -> Self {
        Self::LaunchFailed(msg.into())
    }

    pub fn signal_failed(msg: impl Into<String>) -> Self {
        Self::SignalFailed(msg.into())
    }
}
