//! Child-process supervision.
//!
//! A [`ProcessSupervisor`] owns one child process and mediates all mutation
//! of its observable state (pid, status, stats, log buffer) behind a single
//! per-handle read/write lock.

mod log_buffer;
mod supervisor;

pub use log_buffer::{LogBuffer, LogLine, LogStream};
pub use supervisor::{LaunchSpec, ProcessSupervisor};

use serde::Serialize;

/// Status of a supervised process.
///
/// `Stopped` is both the initial state and the resting state between runs;
/// a handle can cycle through `run`/`terminate` indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    #[default]
    Stopped,
    Running,
    Error,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Running => "running",
            ProcessStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
