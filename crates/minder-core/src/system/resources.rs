//! Per-process resource sampling via sysinfo.
//!
//! One `ResourceTracker` is shared by every supervisor so the underlying
//! process table is refreshed once per tick instead of once per process.

use crate::config::SamplerConfig;
use crate::error::{MinderError, Result};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One sample of a process's resource usage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSample {
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// CPU utilization percentage (0-100+, can exceed 100 on multi-core).
    /// Diffed between refreshes, so the first sample after startup reads 0.
    pub cpu_percent: f64,
}

/// Resource tracker for monitoring supervised processes.
pub struct ResourceTracker {
    /// How long a process-table refresh stays valid.
    refresh_ttl: Duration,
    /// System info instance.
    system: RwLock<System>,
    /// Last refresh time.
    last_refresh: RwLock<Option<Instant>>,
}

impl ResourceTracker {
    /// Create a new resource tracker.
    ///
    /// # Arguments
    ///
    /// * `refresh_ttl` - How long to trust the last process-table refresh
    pub fn new(refresh_ttl: Duration) -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        Self {
            refresh_ttl,
            system: RwLock::new(system),
            last_refresh: RwLock::new(Some(Instant::now())),
        }
    }

    /// Sample resident memory and CPU usage for a process.
    ///
    /// Returns [`MinderError::Lookup`] if the process is no longer in the
    /// process table. Both metrics come from the same table entry, so there
    /// is no partial result: either the entry exists and both are read, or
    /// the lookup fails as a whole.
    pub fn sample(&self, pid: u32) -> Result<ProcessSample> {
        self.maybe_refresh();

        let system = self.system.read().unwrap();
        let process = system
            .process(Pid::from_u32(pid))
            .ok_or(MinderError::Lookup { pid })?;

        Ok(ProcessSample {
            memory_bytes: process.memory(),
            cpu_percent: f64::from(process.cpu_usage()),
        })
    }

    /// Check if a process exists, bypassing the refresh TTL for that pid.
    pub fn process_exists(&self, pid: u32) -> bool {
        let target = [Pid::from_u32(pid)];
        let mut system = self.system.write().unwrap();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&target),
            true,
            ProcessRefreshKind::new(),
        );
        system.process(Pid::from_u32(pid)).is_some()
    }

    /// Refresh the process table if the TTL has expired.
    fn maybe_refresh(&self) {
        let should_refresh = {
            let last_refresh = self.last_refresh.read().unwrap();
            last_refresh
                .map(|t| t.elapsed() >= self.refresh_ttl)
                .unwrap_or(true)
        };

        if should_refresh {
            let mut system = self.system.write().unwrap();
            system.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::new().with_cpu().with_memory(),
            );

            let mut last_refresh = self.last_refresh.write().unwrap();
            *last_refresh = Some(Instant::now());
        }
    }
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self::new(SamplerConfig::REFRESH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_own_process() {
        let tracker = ResourceTracker::default();
        let sample = tracker.sample(std::process::id()).unwrap();

        // The test runner certainly has resident memory.
        assert!(sample.memory_bytes > 0);
        assert!(sample.cpu_percent >= 0.0);
    }

    #[test]
    fn test_sample_nonexistent_process() {
        let tracker = ResourceTracker::default();
        let err = tracker.sample(999_999_999).unwrap_err();
        assert!(matches!(err, MinderError::Lookup { pid: 999_999_999 }));
    }

    #[test]
    fn test_process_exists() {
        let tracker = ResourceTracker::default();

        assert!(tracker.process_exists(std::process::id()));
        assert!(!tracker.process_exists(999_999_999));
    }
}
