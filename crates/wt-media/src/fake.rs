//! Scripted transcoder for tests and dry runs.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use wt_models::Profile;

use crate::error::{MediaError, MediaResult};
use crate::transcoder::{ProcessHandle, RunningTranscode, Terminate, TranscodeExit, Transcoder};

/// What a launch of [`FakeTranscoder`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
    /// Write the output file and exit 0
    Succeed,
    /// Exit with the given code without output
    ExitWith(i32),
    /// Fail to start
    FailLaunch,
    /// Run until terminated, then report death by signal
    HoldUntilTerminated,
}

/// A transcoder that never spawns a process.
///
/// Handles carry the launch count as a synthetic pid.
pub struct FakeTranscoder {
    outcome: FakeOutcome,
    launches: AtomicUsize,
}

impl FakeTranscoder {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            launches: AtomicUsize::new(0),
        }
    }

    /// Number of launch attempts so far.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

struct WatchTarget(watch::Sender<bool>);

impl Terminate for WatchTarget {
    fn terminate(&self) -> MediaResult<()> {
        self.0.send_replace(true);
        Ok(())
    }
}

struct FakeProcess {
    outcome: FakeOutcome,
    output: PathBuf,
    terminated: watch::Receiver<bool>,
    handle: ProcessHandle,
}

#[async_trait]
impl RunningTranscode for FakeProcess {
    fn handle(&self) -> ProcessHandle {
        self.handle.clone()
    }

    async fn wait(mut self: Box<Self>) -> MediaResult<TranscodeExit> {
        match self.outcome {
            FakeOutcome::Succeed => {
                tokio::fs::write(&self.output, b"transcoded").await?;
                Ok(TranscodeExit::Success)
            }
            FakeOutcome::ExitWith(0) => Ok(TranscodeExit::Success),
            FakeOutcome::ExitWith(code) => Ok(TranscodeExit::Failure { code: Some(code) }),
            FakeOutcome::HoldUntilTerminated | FakeOutcome::FailLaunch => {
                // Sender lives in the handle, so this only ends on terminate
                let _ = self.terminated.wait_for(|stopped| *stopped).await;
                Ok(TranscodeExit::Failure { code: None })
            }
        }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn launch(
        &self,
        _input: &Path,
        profile: &Profile,
        output: &Path,
    ) -> MediaResult<Box<dyn RunningTranscode>> {
        let launch = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.outcome == FakeOutcome::FailLaunch {
            return Err(MediaError::launch_failed(format!(
                "scripted launch failure for {}",
                profile.name
            )));
        }
        let (tx, rx) = watch::channel(false);
        Ok(Box::new(FakeProcess {
            outcome: self.outcome,
            output: output.to_path_buf(),
            terminated: rx,
            handle: ProcessHandle::new(Some(launch as u32), Arc::new(WatchTarget(tx))),
        }))
    }
}
