//! Coordinator configuration.

use std::time::Duration;

/// Timing and limits for driving a cluster.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long to wait for a node's reply to one request.
    pub phase_timeout: Duration,

    /// Extra attempts after the first one times out.
    pub max_retries: u32,

    /// Rounds allowed at a single moment before giving up on it settling.
    pub max_delta_rounds: u32,

    /// How long discovery waits for announcements.
    pub discovery_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            phase_timeout: Duration::from_secs(2),
            max_retries: 2,
            max_delta_rounds: 64,
            discovery_timeout: Duration::from_millis(500),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_max_delta_rounds(mut self, rounds: u32) -> Self {
        self.max_delta_rounds = rounds;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Total attempts made per request.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
