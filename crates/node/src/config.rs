//! Node configuration.

use netsim_types::NodeName;
use serde::{Deserialize, Serialize};

/// Identity and declared resources of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Cluster-unique name.
    pub name: NodeName,

    /// Relative share of devices this node should receive during placement.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

fn default_capacity() -> u32 {
    1
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: NodeName::new("node-0"),
            capacity: default_capacity(),
        }
    }
}

impl NodeConfig {
    /// A config for `name` with default capacity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: NodeName::new(name),
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }
}
