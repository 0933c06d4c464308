//! Configuration constants for supervision and sampling.

use std::time::Duration;

/// Supervisor-level tunables.
pub struct SupervisorConfig;

impl SupervisorConfig {
    /// Maximum number of log lines retained per process.
    pub const MAX_LOG_LINES: usize = 1000;
    /// Grace period between the interrupt signal and a forced kill of the
    /// process group.
    pub const TERMINATE_GRACE: Duration = Duration::from_secs(10);
}

/// Stats sampler tunables.
pub struct SamplerConfig;

impl SamplerConfig {
    /// Tick interval for the periodic stats sampler.
    pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);
    /// Budget for a single `update_stats` call before it is abandoned.
    pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(2);
    /// How long the resource tracker trusts its last process-table refresh.
    /// Kept below `SAMPLE_INTERVAL` so every tick sees fresh numbers.
    pub const REFRESH_TTL: Duration = Duration::from_millis(250);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_ttl_is_below_sample_interval() {
        assert!(SamplerConfig::REFRESH_TTL < SamplerConfig::SAMPLE_INTERVAL);
    }

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(SupervisorConfig::TERMINATE_GRACE > Duration::ZERO);
        assert!(SamplerConfig::UPDATE_TIMEOUT > Duration::ZERO);
        assert!(SupervisorConfig::MAX_LOG_LINES > 0);
    }
}
