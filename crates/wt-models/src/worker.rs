//! Worker status and registry records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Worker lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Started, not yet polling
    #[default]
    Online,
    /// Polling for work
    Idle,
    /// Executing a task
    Busy,
    /// Shut down
    Offline,
}

impl WorkerStatus {
    pub const ALL: [WorkerStatus; 4] = [
        WorkerStatus::Online,
        WorkerStatus::Idle,
        WorkerStatus::Busy,
        WorkerStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Online => "online",
            WorkerStatus::Idle => "idle",
            WorkerStatus::Busy => "busy",
            WorkerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkerStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownWorkerStatus(s.to_string()))
    }
}

/// Latest known state of a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerRecord {
    pub addr: String,
    pub status: WorkerStatus,
    pub last_updated: DateTime<Utc>,
}

/// Append-only history entry of a worker status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerEvent {
    pub addr: String,
    pub status: WorkerStatus,
    pub at: DateTime<Utc>,
}

impl WorkerEvent {
    pub fn new(addr: impl Into<String>, status: WorkerStatus) -> Self {
        Self {
            addr: addr.into(),
            status,
            at: Utc::now(),
        }
    }

    /// Registry record reflecting this event.
    pub fn to_record(&self) -> WorkerRecord {
        WorkerRecord {
            addr: self.addr.clone(),
            status: self.status,
            last_updated: self.at,
        }
    }
}
