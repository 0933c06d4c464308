//! Error types for minder.

use thiserror::Error;

/// Main error type for supervision operations.
#[derive(Debug, Error)]
pub enum MinderError {
    /// The launch specification is unusable (empty command, bad working
    /// directory). The handle moves to `Error`.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The OS refused to create the process or its pipes.
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process vanished from the process table while sampling.
    /// Handle state is left unchanged.
    #[error("Process {pid} not found in the process table")]
    Lookup { pid: u32 },

    /// The OS rejected the termination signal.
    #[error("Failed to signal process group {pid}: {message}")]
    Signal { pid: u32, message: String },

    /// Terminate was called on a handle that is not running. No signal is
    /// sent; signaling process group 0 is OS-defined behavior we refuse
    /// to invoke.
    #[error("Process is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for supervision operations.
pub type Result<T> = std::result::Result<T, MinderError>;

impl MinderError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        MinderError::Config {
            message: message.into(),
        }
    }
}
