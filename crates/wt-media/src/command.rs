//! FFmpeg command builder.

use std::path::{Path, PathBuf};

use wt_models::Profile;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
    progress: bool,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
            progress: true,
        }
    }

    /// Command transcoding `input` to `output` with the profile's settings.
    pub fn for_profile(input: impl AsRef<Path>, output: impl AsRef<Path>, profile: &Profile) -> Self {
        Self::new(input, output).output_args(profile.encoder_args())
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Disable `-progress pipe:2`.
    pub fn without_progress(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        if self.progress {
            args.push("-progress".to_string());
            args.push("pipe:2".to_string());
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Resolve the FFmpeg binary: an explicit path, or a `PATH` lookup.
pub fn check_ffmpeg(explicit: Option<&Path>) -> MediaResult<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(MediaError::FfmpegNotFound(path.display().to_string())),
        None => which::which("ffmpeg").map_err(|e| MediaError::FfmpegNotFound(e.to_string())),
    }
}
