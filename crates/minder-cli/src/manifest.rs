//! Process manifest loading.

use anyhow::{bail, Context, Result};
use minder_core::LaunchSpec;
use serde::Deserialize;
use std::path::Path;

/// On-disk manifest: the list of commands to supervise.
///
/// ```json
/// {
///   "processes": [
///     { "working_dir": "/srv/app", "command_line": "python server.py" }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub processes: Vec<LaunchSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        if manifest.processes.is_empty() {
            bail!("manifest {} lists no processes", path.display());
        }
        Ok(manifest)
    }
}
