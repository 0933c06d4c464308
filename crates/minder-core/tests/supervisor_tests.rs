//! End-to-end supervision scenarios against real child processes.
//!
//! These spawn actual OS processes (`sleep`, `seq`, `ls`), so they are
//! Unix-only.

#![cfg(unix)]

use minder_core::{
    LaunchSpec, LogStream, MinderError, ProcessStatus, ProcessSupervisor, ResourceTracker,
    StatsSampler,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn supervisor_for(command: &str, dir: &Path) -> ProcessSupervisor {
    ProcessSupervisor::new(
        LaunchSpec {
            working_dir: dir.to_path_buf(),
            command_line: command.to_string(),
        },
        Arc::new(ResourceTracker::default()),
    )
}

#[tokio::test]
async fn run_then_terminate_round_trip() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("sleep 5", dir.path());

    supervisor.run().await.unwrap();
    assert_eq!(supervisor.status(), ProcessStatus::Running);
    let pid = supervisor.pid();
    assert!(pid > 0);

    supervisor.terminate().await.unwrap();
    assert_eq!(supervisor.status(), ProcessStatus::Stopped);
    assert_eq!(supervisor.pid(), 0);
    assert_eq!(supervisor.memory_bytes(), 0);
    assert_eq!(supervisor.cpu_percent(), 0.0);

    // The whole group is gone from the process table, not just reparented.
    let tracker = ResourceTracker::default();
    assert!(!tracker.process_exists(pid));
}

#[tokio::test]
async fn handle_can_cycle_run_terminate_run() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("sleep 5", dir.path());

    supervisor.run().await.unwrap();
    let first_pid = supervisor.pid();
    supervisor.terminate().await.unwrap();

    supervisor.run().await.unwrap();
    assert_eq!(supervisor.status(), ProcessStatus::Running);
    assert!(supervisor.pid() > 0);
    assert_ne!(supervisor.pid(), first_pid);

    supervisor.terminate().await.unwrap();
}

#[tokio::test]
async fn second_terminate_reports_not_running() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("sleep 5", dir.path());

    supervisor.run().await.unwrap();
    supervisor.terminate().await.unwrap();

    // No signal goes out for a stopped handle; group 0 is never targeted.
    let err = supervisor.terminate().await.unwrap_err();
    assert!(matches!(err, MinderError::NotRunning));
    assert_eq!(supervisor.status(), ProcessStatus::Stopped);
}

#[tokio::test]
async fn stats_reflect_a_running_process() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("sleep 5", dir.path());

    supervisor.run().await.unwrap();

    // Let the resource tracker's refresh TTL lapse so the sample sees the
    // freshly spawned process.
    tokio::time::sleep(Duration::from_millis(400)).await;
    supervisor.update_stats().await.unwrap();

    assert!(supervisor.memory_bytes() > 0);
    assert!(supervisor.cpu_percent() >= 0.0);

    supervisor.terminate().await.unwrap();
    assert_eq!(supervisor.memory_bytes(), 0);
    assert_eq!(supervisor.cpu_percent(), 0.0);
}

#[tokio::test]
async fn capture_keeps_the_last_thousand_lines_in_order() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("seq 1 1500", dir.path());

    supervisor.run().await.unwrap();
    supervisor.wait_exit().await.unwrap();

    assert_eq!(supervisor.log_len(), 1000);
    let lines = supervisor.recent_logs(1000);
    assert_eq!(lines.first().unwrap().content, "501");
    assert_eq!(lines.last().unwrap().content, "1500");
    assert!(lines.iter().all(|line| line.stream == LogStream::Stdout));
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line.content, (501 + i).to_string());
    }
}

#[tokio::test]
async fn stderr_lines_are_tagged_with_their_stream() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("ls /minder-no-such-path", dir.path());

    supervisor.run().await.unwrap();
    supervisor.wait_exit().await.unwrap();

    let lines = supervisor.recent_logs(10);
    assert!(!lines.is_empty());
    assert!(lines.iter().any(|line| line.stream == LogStream::Stderr));
}

#[tokio::test]
async fn terminate_resolves_a_naturally_exited_child() {
    let dir = TempDir::new().unwrap();
    let supervisor = supervisor_for("sleep 0.1", dir.path());

    supervisor.run().await.unwrap();
    supervisor.wait_exit().await.unwrap();

    // Only terminate moves the state machine; the exited child still shows
    // as Running until the caller resolves it.
    assert_eq!(supervisor.status(), ProcessStatus::Running);

    supervisor.terminate().await.unwrap();
    assert_eq!(supervisor.status(), ProcessStatus::Stopped);
    assert_eq!(supervisor.pid(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_race_terminate_without_tearing() {
    let dir = TempDir::new().unwrap();
    let supervisor = Arc::new(supervisor_for("sleep 5", dir.path()));

    supervisor.run().await.unwrap();

    let mut updates = Vec::new();
    for _ in 0..100 {
        let supervisor = supervisor.clone();
        updates.push(tokio::spawn(async move {
            // Lookup errors are expected once the process dies mid-race.
            let _ = supervisor.update_stats().await;
        }));
    }
    let terminator = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move { supervisor.terminate().await })
    };

    for update in updates {
        update.await.unwrap();
    }
    terminator.await.unwrap().unwrap();

    // Never a torn mix: once stopped, every stat is zeroed.
    assert_eq!(supervisor.status(), ProcessStatus::Stopped);
    assert_eq!(supervisor.pid(), 0);
    assert_eq!(supervisor.memory_bytes(), 0);
    assert_eq!(supervisor.cpu_percent(), 0.0);
}

#[tokio::test]
async fn sampler_updates_running_handles_and_orders_snapshots() {
    let dir = TempDir::new().unwrap();
    let tracker = Arc::new(ResourceTracker::default());

    let running = Arc::new(ProcessSupervisor::new(
        LaunchSpec {
            working_dir: dir.path().to_path_buf(),
            command_line: "sleep 5".to_string(),
        },
        tracker.clone(),
    ));
    let idle = Arc::new(ProcessSupervisor::new(
        LaunchSpec {
            working_dir: dir.path().to_path_buf(),
            command_line: "sleep 5".to_string(),
        },
        tracker,
    ));

    running.run().await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let sampler = StatsSampler::new(vec![running.clone(), idle]);
    sampler.sample_once().await;

    let snapshots = sampler.snapshots();
    assert_eq!(snapshots.len(), 2);
    // pid 0 (never run) sorts ahead of the live pid.
    assert_eq!(snapshots[0].pid, 0);
    assert_eq!(snapshots[0].status, ProcessStatus::Stopped);
    assert_eq!(snapshots[1].status, ProcessStatus::Running);
    assert!(snapshots[1].memory_bytes > 0);

    running.terminate().await.unwrap();
}
