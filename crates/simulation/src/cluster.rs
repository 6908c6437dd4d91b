//! An in-process cluster: nodes on a [`MemoryBus`] plus a coordinator.

use crate::{Circuit, Coordinator, CoordinatorConfig, CoordinatorError};
use netsim_core::ModelCatalog;
use netsim_models::builtin_catalog;
use netsim_network::MemoryBus;
use netsim_node::{spawn_node, Node, NodeConfig, NodeHandle};
use netsim_types::NodeName;
use tokio::task::JoinError;
use tracing::info;

/// Nodes running as tokio tasks on a shared bus, driven by one coordinator.
pub struct Cluster {
    bus: MemoryBus,
    handles: Vec<NodeHandle>,
    coordinator: Coordinator<MemoryBus>,
}

impl Cluster {
    /// Start one node per config and discover them.
    pub async fn start(
        nodes: Vec<NodeConfig>,
        catalog: ModelCatalog,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let bus = MemoryBus::new();
        let discovery = bus.subscribe_discovery();
        let expected = nodes.len();
        let mut handles = Vec::with_capacity(expected);
        for node_config in nodes {
            let node = Node::new(node_config, catalog.clone());
            handles.push(spawn_node(bus.clone(), node)?);
        }

        let mut coordinator = Coordinator::new(bus.clone(), discovery, catalog, config);
        coordinator.discover(Some(expected)).await?;
        info!(nodes = expected, "Cluster started");
        Ok(Self {
            bus,
            handles,
            coordinator,
        })
    }

    /// Start `count` nodes named `node-0`, `node-1`, ... with the built-in
    /// catalog.
    pub async fn with_nodes(count: usize, config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        Self::start(node_configs(count, None), builtin_catalog()?, config).await
    }

    /// Start enough nodes for `circuit`, load it and initialise.
    ///
    /// At least `count` nodes are started, plus any node the circuit pins a
    /// device to.
    pub async fn for_circuit(
        circuit: &Circuit,
        count: usize,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let configs = node_configs(count, Some(circuit));
        let mut cluster = Self::start(configs, builtin_catalog()?, config).await?;
        cluster.coordinator.load(circuit).await?;
        cluster.coordinator.initialise().await?;
        Ok(cluster)
    }

    pub fn coordinator(&self) -> &Coordinator<MemoryBus> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator<MemoryBus> {
        &mut self.coordinator
    }

    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    pub fn node_names(&self) -> Vec<NodeName> {
        self.handles.iter().map(|h| h.name().clone()).collect()
    }

    /// Kill a node's task, as if its process died.
    pub fn abort_node(&self, name: &NodeName) -> bool {
        match self.handles.iter().find(|h| h.name() == name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Stop every node and return their final state.
    ///
    /// Aborted nodes are left out.
    pub async fn shutdown(self) -> Result<Vec<Node>, JoinError> {
        let mut nodes = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.stop().await {
                Ok(node) => nodes.push(node),
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(nodes)
    }
}

fn node_configs(count: usize, circuit: Option<&Circuit>) -> Vec<NodeConfig> {
    let mut names: Vec<NodeName> = (0..count).map(|i| NodeName::new(format!("node-{i}"))).collect();
    if let Some(circuit) = circuit {
        for pinned in circuit.pinned_nodes() {
            if !names.contains(&pinned) {
                names.push(pinned);
            }
        }
    }
    names
        .into_iter()
        .map(|name| NodeConfig {
            name,
            ..NodeConfig::default()
        })
        .collect()
}
