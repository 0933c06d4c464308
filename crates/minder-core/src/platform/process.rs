//! Sending termination signals to a whole process tree.
//!
//! Supervised children are spawned as process-group leaders, so on Unix the
//! child's pid doubles as its pgid and one `killpg` reaches the child and
//! every descendant that did not detach from the group.

use crate::error::{MinderError, Result};
use tracing::debug;

/// Signal level for terminating a process tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateSignal {
    /// Polite request to stop (SIGINT / plain `taskkill`).
    Interrupt,
    /// Forced kill (SIGKILL / `taskkill /F`).
    Kill,
}

/// Signal the process group led by `pid`.
///
/// A group that no longer exists counts as success: the processes we wanted
/// gone are gone.
///
/// # Platform Behavior
/// - **Linux/macOS**: `killpg(pid, SIGINT|SIGKILL)`
/// - **Windows**: `taskkill /PID {pid} /T [/F]` (tree-wide)
pub fn signal_process_group(pid: u32, signal: TerminateSignal) -> Result<()> {
    #[cfg(unix)]
    {
        signal_process_group_unix(pid, signal)
    }

    #[cfg(windows)]
    {
        signal_process_group_windows(pid, signal)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (pid, signal);
        Err(MinderError::Other(
            "Process group termination not implemented for this platform".into(),
        ))
    }
}

#[cfg(unix)]
fn signal_process_group_unix(pid: u32, signal: TerminateSignal) -> Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let sig = match signal {
        TerminateSignal::Interrupt => Signal::SIGINT,
        TerminateSignal::Kill => Signal::SIGKILL,
    };

    debug!(pid, ?sig, "signaling process group");
    match killpg(Pid::from_raw(pid as i32), sig) {
        Ok(()) => Ok(()),
        // Group already gone
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(MinderError::Signal {
            pid,
            message: e.to_string(),
        }),
    }
}

#[cfg(windows)]
fn signal_process_group_windows(pid: u32, signal: TerminateSignal) -> Result<()> {
    use std::process::Command;

    let pid_arg = pid.to_string();
    let mut args = vec!["/PID", pid_arg.as_str(), "/T"];
    if signal == TerminateSignal::Kill {
        args.push("/F");
    }

    debug!(pid, ?signal, "terminating process tree with taskkill");
    let output = Command::new("taskkill")
        .args(&args)
        .output()
        .map_err(|e| MinderError::Signal {
            pid,
            message: format!("failed to run taskkill: {}", e),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    // "not found" errors are OK - tree already dead
    if stderr.contains("not found") || stderr.contains("not running") {
        Ok(())
    } else {
        Err(MinderError::Signal {
            pid,
            message: stderr.into_owned(),
        })
    }
}
