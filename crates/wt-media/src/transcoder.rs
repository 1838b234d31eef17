//! Transcoder process lifecycle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use wt_models::Profile;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::progress::{parse_progress_line, FfmpegProgress};

/// How a transcoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeExit {
    Success,
    /// Non-zero exit; `code` is `None` when ended by a signal
    Failure { code: Option<i32> },
}

impl TranscodeExit {
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failure {
                code: status.code(),
            }
        }
    }
}

/// Something that can be asked to stop early.
pub trait Terminate: Send + Sync {
    fn terminate(&self) -> MediaResult<()>;
}

/// Cloneable handle to a running transcoder process.
#[derive(Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    target: Arc<dyn Terminate>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>, target: Arc<dyn Terminate>) -> Self {
        Self { pid, target }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the process to terminate. Does not wait for it to exit.
    pub fn terminate(&self) -> MediaResult<()> {
        self.target.terminate()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle").field("pid", &self.pid).finish()
    }
}

/// A launched transcoder.
#[async_trait]
pub trait RunningTranscode: Send {
    fn handle(&self) -> ProcessHandle;

    /// Wait for the process to exit.
    async fn wait(self: Box<Self>) -> MediaResult<TranscodeExit>;
}

/// Launches transcoder processes.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn launch(
        &self,
        input: &Path,
        profile: &Profile,
        output: &Path,
    ) -> MediaResult<Box<dyn RunningTranscode>>;
}

struct SigtermTarget {
    pid: u32,
}

impl Terminate for SigtermTarget {
    fn terminate(&self) -> MediaResult<()> {
        let pid = i32::try_from(self.pid)
            .map_err(|_| MediaError::signal_failed(format!("pid {} out of range", self.pid)))?;
        kill(Pid::from_raw(pid), Signal::SIGTERM)
            .map_err(|e| MediaError::signal_failed(format!("SIGTERM to {}: {}", pid, e)))
    }
}

/// Runs the FFmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

struct FfmpegProcess {
    child: Child,
    handle: ProcessHandle,
    progress: Option<JoinHandle<usize>>,
}

#[async_trait]
impl RunningTranscode for FfmpegProcess {
    fn handle(&self) -> ProcessHandle {
        self.handle.clone()
    }

    async fn wait(mut self: Box<Self>) -> MediaResult<TranscodeExit> {
        let status = self.child.wait().await?;
        if let Some(progress) = self.progress.take() {
            let _ = progress.await;
        }
        let exit = TranscodeExit::from_status(status);
        debug!(pid = ?self.handle.pid(), ?exit, "FFmpeg exited");
        Ok(exit)
    }
}

/// Read FFmpeg's stderr until EOF, logging progress and messages.
///
/// Bytes are decoded lossily and reading never stops early: a closed pipe
/// would kill FFmpeg with SIGPIPE on its next write. Returns the number of
/// lines read.
async fn drain_stderr<R>(stderr: R, profile: &'static str) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut current = FfmpegProgress::default();
    let mut lines = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(profile, "Failed to read FFmpeg stderr: {}", e);
                break;
            }
        }
        lines += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end();
        if let Some(snapshot) = parse_progress_line(line, &mut current) {
            debug!(
                profile,
                frame = snapshot.frame,
                out_time_ms = snapshot.out_time_ms,
                speed = snapshot.speed,
                "Transcode progress"
            );
        } else if !line.contains('=') {
            debug!(profile, "ffmpeg: {}", line);
        }
    }
    lines
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn launch(
        &self,
        input: &Path,
        profile: &Profile,
        output: &Path,
    ) -> MediaResult<Box<dyn RunningTranscode>> {
        if !tokio::fs::try_exists(input).await? {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
        // Stale output from an earlier attempt would be overwritten anyway
        if tokio::fs::try_exists(output).await? {
            tokio::fs::remove_file(output).await?;
        }

        let args = FfmpegCommand::for_profile(input, output, profile).build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::launch_failed(format!("{}: {}", self.binary.display(), e)))?;

        let pid = child
            .id()
            .ok_or_else(|| MediaError::launch_failed("process exited before it could be tracked"))?;

        let progress = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr, profile.name)));

        info!(pid, profile = profile.name, "Launched FFmpeg");
        Ok(Box::new(FfmpegProcess {
            child,
            handle: ProcessHandle::new(Some(pid), Arc::new(SigtermTarget { pid })),
            progress,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_mapping() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(
            TranscodeExit::from_status(std::process::ExitStatus::from_raw(0)),
            TranscodeExit::Success
        );
        // wait status 255 << 8 is exit code 255
        assert_eq!(
            TranscodeExit::from_status(std::process::ExitStatus::from_raw(255 << 8)),
            TranscodeExit::Failure { code: Some(255) }
        );
        // raw 15 is death by SIGTERM
        assert_eq!(
            TranscodeExit::from_status(std::process::ExitStatus::from_raw(15)),
            TranscodeExit::Failure { code: None }
        );
    }

    #[tokio::test]
    async fn test_launch_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new("ffmpeg");
        let profile = wt_models::find_profile("baseline").unwrap();
        let err = transcoder
            .launch(&dir.path().join("absent.mov"), profile, &dir.path().join("out.mp4"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_launch_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mov");
        tokio::fs::write(&input, b"x").await.unwrap();
        let transcoder = FfmpegTranscoder::new(dir.path().join("no-ffmpeg"));
        let profile = wt_models::find_profile("baseline").unwrap();
        let err = transcoder
            .launch(&input, profile, &dir.path().join("out.mp4"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MediaError::LaunchFailed(_)));
    }

    #[tokio::test]
    async fn test_drain_survives_invalid_utf8() {
        let stderr: &[u8] = b"caf\xe9\nframe=1\nprogress=continue\nlast line\n";
        assert_eq!(drain_stderr(stderr, "baseline").await, 4);
    }

    #[tokio::test]
    async fn test_noisy_stderr_does_not_kill_ffmpeg() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mov");
        tokio::fs::write(&input, b"x").await.unwrap();

        let script = dir.path().join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\nprintf 'caf\\351\\n' >&2\nsleep 0.2\ni=0\nwhile [ $i -lt 2000 ]; do echo \"frame=$i\" >&2; i=$((i+1)); done\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let profile = wt_models::find_profile("baseline").unwrap();
        let exit = FfmpegTranscoder::new(&script)
            .launch(&input, profile, &dir.path().join("out.mp4"))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(exit, TranscodeExit::Success);
    }
}
