//! Platform-specific process-group control.

mod process;

pub use process::{signal_process_group, TerminateSignal};
