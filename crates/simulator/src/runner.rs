//! Runs a circuit on a fresh cluster.

use crate::SimulatorConfig;
use netsim_core::{Direction, ModelCatalog, NetlistError};
use netsim_simulation::{Circuit, Cluster, CoordinatorError, RunReport, Waveform};
use netsim_types::{NodeName, UnitId};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub run: RunReport,
    pub nodes: Vec<NodeName>,
    pub placement: BTreeMap<UnitId, NodeName>,
    pub waveform: Waveform,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} nodes, {} moments, {} rounds",
            self.nodes.len(),
            self.run.moments,
            self.run.rounds
        )?;
        for (unit, node) in &self.placement {
            writeln!(f, "  {unit} on {}", node.as_str())?;
        }
        writeln!(f)?;
        write!(f, "{}", self.waveform)
    }
}

pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Load the configured circuit file and run it.
    pub async fn run(&self) -> Result<SimulationReport, CoordinatorError> {
        let circuit = Circuit::from_path(&self.config.circuit)?;
        self.run_circuit(&circuit).await
    }

    /// Run an already parsed circuit.
    pub async fn run_circuit(&self, circuit: &Circuit) -> Result<SimulationReport, CoordinatorError> {
        let mut cluster =
            Cluster::for_circuit(circuit, self.config.nodes, self.config.coordinator.clone()).await?;
        let nodes = cluster.node_names();
        info!(
            nodes = nodes.len(),
            devices = circuit.devices.len(),
            until = %self.config.until,
            "Simulation starting"
        );

        let result = cluster.coordinator_mut().run_until(self.config.until).await;
        let coordinator = cluster.coordinator();
        let placement = coordinator.placements().clone();
        let waveform = coordinator.waveform().clone();
        if let Err(e) = cluster.shutdown().await {
            warn!(error = %e, "Node task failed during shutdown");
        }

        Ok(SimulationReport {
            run: result?,
            nodes,
            placement,
            waveform,
        })
    }
}

/// One line per catalog entry: selector, inputs and outputs.
pub fn describe_catalog(catalog: &ModelCatalog) -> Result<Vec<String>, NetlistError> {
    catalog
        .selectors()
        .map(|selector| {
            let pins = catalog.create(selector)?.pins();
            let names = |direction: Direction| {
                pins.iter()
                    .filter(|p| p.direction == direction)
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            Ok(format!(
                "{selector:<12} {} -> {}",
                names(Direction::Input),
                names(Direction::Output)
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_models::builtin_catalog;
    use netsim_test_helpers::circuits;
    use netsim_types::{Moment, NetId, Signal};

    #[tokio::test]
    async fn test_runs_half_adder() {
        let circuit = Circuit::from_toml(circuits::HALF_ADDER).unwrap();
        let config = SimulatorConfig::new("unused.toml")
            .with_nodes(2)
            .with_until(Moment(30));
        let report = Simulator::new(config).run_circuit(&circuit).await.unwrap();

        assert_eq!(report.nodes.len(), 2);
        assert_eq!(report.run.last_moment, Some(Moment(30)));
        assert_eq!(
            report.waveform.value_at(&NetId::new("C"), Moment(30)),
            Signal::One
        );
        let text = report.to_string();
        assert!(text.starts_with("2 nodes, 4 moments"));
        assert!(text.contains("carry on node-1"));
    }

    #[tokio::test]
    async fn test_missing_circuit_file() {
        let config = SimulatorConfig::new("/nonexistent/netsim/circuit.toml");
        let err = Simulator::new(config).run().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Circuit(_)));
    }

    #[test]
    fn test_describe_catalog() {
        let lines = describe_catalog(&builtin_catalog().unwrap()).unwrap();
        assert_eq!(lines.len(), 12);
        let and2 = lines.iter().find(|l| l.starts_with("and2")).unwrap();
        assert!(and2.ends_with("a b -> q"));
    }
}
