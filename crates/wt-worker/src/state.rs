//! In-memory worker state.

use serde::{Deserialize, Serialize};

use wt_media::ProcessHandle;
use wt_models::{TaskId, WorkerStatus};

/// Status and running process of a worker.
///
/// Kept behind one lock: a process handle is only ever present while
/// the status is BUSY.
#[derive(Debug, Default)]
pub struct WorkerState {
    pub status: WorkerStatus,
    pub process: Option<ProcessHandle>,
    /// Set by a cancel request before the process is signalled
    pub cancel_requested: bool,
    pub current_task: Option<TaskId>,
}

impl WorkerState {
    /// Enter BUSY for a freshly claimed task.
    pub fn begin(&mut self, task: TaskId) {
        self.status = WorkerStatus::Busy;
        self.current_task = Some(task);
        self.process = None;
        self.cancel_requested = false;
    }

    /// Back to IDLE with nothing held.
    pub fn finish(&mut self) {
        self.status = WorkerStatus::Idle;
        self.current_task = None;
        self.process = None;
        self.cancel_requested = false;
    }

    pub fn view(&self, addr: &str) -> WorkerStatusView {
        WorkerStatusView {
            addr: addr.to_string(),
            status: self.status,
            task_id: self.current_task.clone(),
            pid: self.process.as_ref().and_then(|p| p.pid()),
        }
    }
}

/// Worker status as served over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatusView {
    pub addr: String,
    pub status: WorkerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_releases_everything() {
        let mut state = WorkerState::default();
        assert_eq!(state.status, WorkerStatus::Online);

        state.begin(TaskId::from("t1"));
        state.cancel_requested = true;
        assert_eq!(state.view("w1").task_id, Some(TaskId::from("t1")));

        state.finish();
        assert_eq!(state.status, WorkerStatus::Idle);
        assert!(state.process.is_none());
        assert!(!state.cancel_requested);
        assert!(state.current_task.is_none());
    }
}
