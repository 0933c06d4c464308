//! Minder Core - child-process supervision with resource sampling and
//! bounded log capture.
//!
//! Each [`ProcessSupervisor`] owns exactly one child process: it spawns the
//! process in its own process group, drains stdout/stderr into a bounded
//! in-memory log, samples resident memory and CPU usage on demand, and
//! terminates the whole process group when asked. A [`StatsSampler`] drives
//! `update_stats` across an ordered set of supervisors on a fixed tick.
//!
//! # Example
//!
//! ```rust,ignore
//! use minder_core::{LaunchSpec, ProcessSupervisor, ResourceTracker};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> minder_core::Result<()> {
//!     let tracker = Arc::new(ResourceTracker::default());
//!     let supervisor = ProcessSupervisor::new(
//!         LaunchSpec {
//!             working_dir: "/tmp".into(),
//!             command_line: "sleep 30".into(),
//!         },
//!         tracker,
//!     );
//!
//!     supervisor.run().await?;
//!     supervisor.update_stats().await?;
//!     println!("pid {} uses {} bytes", supervisor.pid(), supervisor.memory_bytes());
//!
//!     supervisor.terminate().await?;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod platform;
pub mod process;
pub mod sampler;
pub mod system;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use error::{MinderError, Result};
pub use process::{
    LaunchSpec, LogBuffer, LogLine, LogStream, ProcessStatus, ProcessSupervisor,
};
pub use sampler::{ProcessSnapshot, StatsSampler};
pub use system::{ProcessSample, ResourceTracker};
