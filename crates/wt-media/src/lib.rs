//! FFmpeg invocation for transcoding tasks.
//!
//! This crate provides:
//! - An FFmpeg argument builder driven by a transcoding profile
//! - The [`Transcoder`] trait with a handle that can terminate the process
//! - Progress parsing for FFmpeg's `-progress` output
//! - A scripted transcoder for tests

pub mod command;
pub mod error;
pub mod fake;
pub mod progress;
pub mod transcoder;

pub use command::{check_ffmpeg, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use fake::{FakeOutcome, FakeTranscoder};
pub use progress::FfmpegProgress;
pub use transcoder::{
    FfmpegTranscoder, ProcessHandle, RunningTranscode, Terminate, TranscodeExit, Transcoder,
};
