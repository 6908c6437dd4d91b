//! Configuration for a simulator run.

use netsim_simulation::CoordinatorConfig;
use netsim_types::Moment;
use std::path::PathBuf;

/// Configuration for a simulator run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// TOML circuit description.
    pub circuit: PathBuf,

    /// Minimum number of nodes to start.
    pub nodes: usize,

    /// Last moment to simulate.
    pub until: Moment,

    pub coordinator: CoordinatorConfig,
}

impl SimulatorConfig {
    pub fn new(circuit: impl Into<PathBuf>) -> Self {
        Self {
            circuit: circuit.into(),
            nodes: 2,
            until: Moment(100),
            coordinator: CoordinatorConfig::default(),
        }
    }

    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_until(mut self, until: Moment) -> Self {
        self.until = until;
        self
    }

    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }
}
