//! Periodic stats sampling across an ordered set of supervisors.

use crate::cancel::CancellationToken;
use crate::config::SamplerConfig;
use crate::process::{ProcessStatus, ProcessSupervisor};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Point-in-time view of one supervised process, for display layers.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub status: ProcessStatus,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub command_line: String,
}

/// Drives `update_stats` on every supervisor on a fixed tick.
///
/// The sampler holds the stable collection of supervisors the caller
/// constructed; [`snapshots`](Self::snapshots) orders its output by pid so
/// display layers get a consistent row-to-process mapping.
pub struct StatsSampler {
    supervisors: Vec<Arc<ProcessSupervisor>>,
    interval: Duration,
    update_timeout: Duration,
}

impl StatsSampler {
    pub fn new(supervisors: Vec<Arc<ProcessSupervisor>>) -> Self {
        Self {
            supervisors,
            interval: SamplerConfig::SAMPLE_INTERVAL,
            update_timeout: SamplerConfig::UPDATE_TIMEOUT,
        }
    }

    /// Override the tick interval (default 500 ms).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn supervisors(&self) -> &[Arc<ProcessSupervisor>] {
        &self.supervisors
    }

    /// Update stats on every supervisor once.
    ///
    /// Failures are logged, not propagated: one vanished process must not
    /// starve the others of samples. Each call is bounded by the update
    /// timeout.
    pub async fn sample_once(&self) {
        for supervisor in &self.supervisors {
            match tokio::time::timeout(self.update_timeout, supervisor.update_stats()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(pid = supervisor.pid(), error = %e, "stats update failed");
                }
                Err(_) => {
                    warn!(pid = supervisor.pid(), "stats update timed out");
                }
            }
        }
    }

    /// Snapshots of every supervised process, ordered by pid.
    pub fn snapshots(&self) -> Vec<ProcessSnapshot> {
        let mut snapshots: Vec<ProcessSnapshot> = self
            .supervisors
            .iter()
            .map(|s| ProcessSnapshot {
                pid: s.pid(),
                status: s.status(),
                cpu_percent: s.cpu_percent(),
                memory_bytes: s.memory_bytes(),
                command_line: s.command_line().to_string(),
            })
            .collect();
        snapshots.sort_by_key(|s| s.pid);
        snapshots
    }

    /// Run [`sample_once`](Self::sample_once) on every tick until the token
    /// is cancelled.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if token.is_cancelled() {
                break;
            }
            self.sample_once().await;
        }
    }
}
