//! Supervisor owning a single child process.

use crate::config::SupervisorConfig;
use crate::error::{MinderError, Result};
use crate::platform::{signal_process_group, TerminateSignal};
use crate::process::{LogBuffer, LogLine, LogStream, ProcessStatus};
use crate::system::ResourceTracker;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, RwLock};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Immutable launch specification, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Directory the command runs in.
    pub working_dir: PathBuf,
    /// Whitespace-delimited program and arguments. No quoting support.
    pub command_line: String,
}

/// Mutable per-handle state. Every field is guarded by the handle's
/// read/write lock; the lock is never held across a blocking OS call.
#[derive(Debug)]
struct HandleState {
    /// OS process id while running, 0 otherwise.
    pid: u32,
    status: ProcessStatus,
    /// Resident memory in bytes, last sample.
    memory_bytes: u64,
    /// CPU utilization percentage, last sample.
    cpu_percent: f64,
    log: LogBuffer,
}

/// Owns exactly one child process and mediates all mutation of its state.
///
/// The supervisor spawns the child as the leader of a fresh process group,
/// wires its stdout/stderr into two log-capture tasks, and terminates the
/// whole group on request. Getters may run concurrently with each other and
/// with any in-flight operation; they always observe the last committed
/// state, never a partial write.
pub struct ProcessSupervisor {
    spec: LaunchSpec,
    tracker: Arc<ResourceTracker>,
    state: Arc<RwLock<HandleState>>,
    /// Child handle, kept for exit reaping and forced-kill escalation.
    /// `kill_on_drop` is set, so discarding the supervisor also takes the
    /// child (and thereby the capture tasks) down with it.
    child: tokio::sync::Mutex<Option<Child>>,
    /// Log-capture tasks, joined on terminate once the pipes close.
    capture_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ProcessSupervisor {
    /// Create a supervisor for one command. The child is not started until
    /// [`run`](Self::run) is called.
    pub fn new(spec: LaunchSpec, tracker: Arc<ResourceTracker>) -> Self {
        Self {
            spec,
            tracker,
            state: Arc::new(RwLock::new(HandleState {
                pid: 0,
                status: ProcessStatus::Stopped,
                memory_bytes: 0,
                cpu_percent: 0.0,
                log: LogBuffer::new(SupervisorConfig::MAX_LOG_LINES),
            })),
            child: tokio::sync::Mutex::new(None),
            capture_tasks: Mutex::new(Vec::new()),
        }
    }

    // Getters

    /// OS process id while running, 0 otherwise.
    pub fn pid(&self) -> u32 {
        self.state.read().unwrap().pid
    }

    pub fn status(&self) -> ProcessStatus {
        self.state.read().unwrap().status
    }

    /// Resident memory in bytes, from the last stats sample.
    pub fn memory_bytes(&self) -> u64 {
        self.state.read().unwrap().memory_bytes
    }

    /// CPU utilization percentage, from the last stats sample.
    pub fn cpu_percent(&self) -> f64 {
        self.state.read().unwrap().cpu_percent
    }

    /// Number of retained log lines.
    pub fn log_len(&self) -> usize {
        self.state.read().unwrap().log.len()
    }

    /// The most recent `limit` log lines, oldest-first.
    pub fn recent_logs(&self, limit: usize) -> Vec<LogLine> {
        self.state.read().unwrap().log.recent(limit)
    }

    pub fn working_dir(&self) -> &Path {
        &self.spec.working_dir
    }

    pub fn command_line(&self) -> &str {
        &self.spec.command_line
    }

    /// Start the configured command.
    ///
    /// Spawns the program in its own process group, wires stdout/stderr
    /// capture, and transitions to `Running` with the child's pid. Any
    /// failure (empty command, bad working directory, spawn refusal)
    /// transitions to `Error` and leaves the pid unset.
    ///
    /// Calling `run` on an already-`Running` handle is a caller error: it
    /// replaces the stored child and pid, and the previous child is killed
    /// when its handle is dropped.
    pub async fn run(&self) -> Result<()> {
        match self.spawn_child().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state.write().unwrap().status = ProcessStatus::Error;
                Err(e)
            }
        }
    }

    async fn spawn_child(&self) -> Result<()> {
        let mut parts = self.spec.command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| MinderError::config("command line is empty"))?;
        let args: Vec<&str> = parts.collect();

        if !self.spec.working_dir.is_dir() {
            return Err(MinderError::config(format!(
                "working directory does not exist: {}",
                self.spec.working_dir.display()
            )));
        }

        let mut command = Command::new(program);
        command
            .args(&args)
            .current_dir(&self.spec.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // The child leads a fresh process group (pgid == its own pid), so
        // terminate() can signal the child and its descendants at once.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| MinderError::Spawn {
            command: self.spec.command_line.clone(),
            source,
        })?;
        let pid = child.id().unwrap_or(0);

        let mut tasks = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            tasks.push(self.spawn_capture(LogStream::Stdout, stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(self.spawn_capture(LogStream::Stderr, stderr));
        }

        *self.child.lock().await = Some(child);
        {
            let mut capture_tasks = self.capture_tasks.lock().unwrap();
            // Capture tasks from a previous run exit with their pipes; drop
            // the finished handles before storing the new ones.
            capture_tasks.retain(|task| !task.is_finished());
            capture_tasks.extend(tasks);
        }

        let mut state = self.state.write().unwrap();
        state.pid = pid;
        state.status = ProcessStatus::Running;
        debug!(pid, command = %self.spec.command_line, "spawned child process");
        Ok(())
    }

    /// Drain one pipe line-by-line into the bounded log buffer.
    ///
    /// The task runs until the pipe closes. A read error other than EOF ends
    /// the capture the same way EOF does; the buffer keeps whatever was
    /// drained.
    fn spawn_capture(
        &self,
        stream: LogStream,
        reader: impl AsyncRead + Unpin + Send + 'static,
    ) -> JoinHandle<()> {
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                state.write().unwrap().log.push(stream, &line);
            }
        })
    }

    /// Refresh memory and CPU usage from the OS.
    ///
    /// A no-op `Ok(())` when the handle is not `Running`. Returns
    /// [`MinderError::Lookup`] without touching state if the process has
    /// vanished. Callers needing a time budget wrap this in
    /// `tokio::time::timeout`; the [`StatsSampler`](crate::StatsSampler)
    /// does so.
    pub async fn update_stats(&self) -> Result<()> {
        let pid = {
            let state = self.state.read().unwrap();
            if state.status != ProcessStatus::Running || state.pid == 0 {
                return Ok(());
            }
            state.pid
        };

        // The sysinfo refresh can block under load; keep it off the
        // async workers and off the handle lock.
        let tracker = self.tracker.clone();
        let sample = tokio::task::spawn_blocking(move || tracker.sample(pid))
            .await
            .map_err(|e| MinderError::Other(format!("stats task failed: {}", e)))??;

        let mut state = self.state.write().unwrap();
        // A concurrent terminate (or restart) may have won the race; never
        // write stats over a handle that no longer runs this pid.
        if state.status != ProcessStatus::Running || state.pid != pid {
            return Ok(());
        }
        state.memory_bytes = sample.memory_bytes;
        state.cpu_percent = sample.cpu_percent;
        Ok(())
    }

    /// Terminate the child's whole process group.
    ///
    /// Sends SIGINT to the group, waits up to
    /// [`SupervisorConfig::TERMINATE_GRACE`] for the child to exit, and
    /// escalates to SIGKILL if it does not. On success the capture tasks
    /// are joined, the handle transitions to `Stopped`, and pid/stats are
    /// zeroed; log lines are retained.
    ///
    /// Calling terminate on a handle that is not `Running` returns
    /// [`MinderError::NotRunning`] without sending any signal.
    ///
    /// If even the forced kill is rejected by the OS, the handle moves to
    /// `Error` with pid and stats cleared: termination has been attempted,
    /// and a stale pid must not masquerade as a live one.
    pub async fn terminate(&self) -> Result<()> {
        let pid = {
            let state = self.state.read().unwrap();
            if state.status != ProcessStatus::Running || state.pid == 0 {
                return Err(MinderError::NotRunning);
            }
            state.pid
        };

        if let Err(e) = signal_process_group(pid, TerminateSignal::Interrupt) {
            warn!(pid, error = %e, "interrupt signal failed, escalating to kill");
            if let Err(kill_err) = signal_process_group(pid, TerminateSignal::Kill) {
                let mut state = self.state.write().unwrap();
                state.status = ProcessStatus::Error;
                state.pid = 0;
                state.memory_bytes = 0;
                state.cpu_percent = 0.0;
                return Err(kill_err);
            }
        }

        self.reap_child(pid).await;
        self.join_capture_tasks().await;

        let mut state = self.state.write().unwrap();
        state.status = ProcessStatus::Stopped;
        state.pid = 0;
        state.memory_bytes = 0;
        state.cpu_percent = 0.0;
        debug!(pid, "terminated process group");
        Ok(())
    }

    /// Wait for the child to exit on its own and drain the capture tasks.
    ///
    /// Does not transition the status: only [`terminate`](Self::terminate)
    /// moves the state machine. A later terminate observes the group as
    /// already gone and resolves to `Stopped`.
    pub async fn wait_exit(&self) -> Result<()> {
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            child.wait().await?;
        }
        self.join_capture_tasks().await;
        Ok(())
    }

    /// Reap the child's exit status, escalating to a group kill if it
    /// ignores the interrupt past the grace period.
    async fn reap_child(&self, pid: u32) {
        let child = self.child.lock().await.take();
        let Some(mut child) = child else { return };

        match tokio::time::timeout(SupervisorConfig::TERMINATE_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(pid, ?status, "child exited"),
            Ok(Err(e)) => debug!(pid, error = %e, "wait on child failed"),
            Err(_) => {
                warn!(pid, "child ignored interrupt, killing process group");
                let _ = signal_process_group(pid, TerminateSignal::Kill);
                // SIGKILL cannot be ignored; this wait is short.
                let _ = child.wait().await;
            }
        }
    }

    async fn join_capture_tasks(&self) {
        let tasks: Vec<_> = self.capture_tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}
