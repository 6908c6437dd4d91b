//! A node's partition and its topology operations.

use crate::NodeConfig;
use netsim_core::{Device, ModelCatalog, NetPropagator, NetlistError};
use netsim_engine::{EventReport, NetlistDriver};
use netsim_messages::ScheduleNetValue;
use netsim_types::{Moment, NetId, NodeName, Signal, UnitId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, trace};

/// One cluster participant: its identity, the model catalog it installs
/// from, and the driver owning its partition.
///
/// A node is plain owned state. Message handlers borrow it mutably one at a
/// time; nothing about it is shared.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    catalog: ModelCatalog,
    driver: NetlistDriver,
}

impl Node {
    pub fn new(config: NodeConfig, catalog: ModelCatalog) -> Self {
        Self {
            config,
            catalog,
            driver: NetlistDriver::new(),
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.config.name
    }

    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn driver(&self) -> &NetlistDriver {
        &self.driver
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Topology
    // ═══════════════════════════════════════════════════════════════════════

    /// Instantiate the model named by `selector` as `unit` and bind its pins.
    ///
    /// Fails without side effects on an unknown selector, a taken unit id,
    /// or any invalid binding.
    pub fn install_model(
        &mut self,
        selector: &str,
        unit: UnitId,
        name: &str,
        bindings: &BTreeMap<String, NetId>,
    ) -> Result<(), NetlistError> {
        let model = self.catalog.create(selector)?;
        let device = Device::new(unit.clone(), name, model);
        self.driver.install(device, bindings)?;
        info!(node = %self.config.name, unit = %unit, selector, "Model installed");
        Ok(())
    }

    /// Bind a pin of an installed model to a net.
    pub fn connect_pin(&mut self, unit: &UnitId, net: NetId, pin: &str) -> Result<(), NetlistError> {
        self.driver.connect_pin(unit, pin, net)
    }

    /// Drop every model and net.
    pub fn clear(&mut self) {
        info!(node = %self.config.name, "Partition cleared");
        self.driver.clear();
    }

    /// Return every model to its reset state, keeping the topology.
    pub fn reset(&mut self) {
        info!(node = %self.config.name, "Partition reset");
        self.driver.reset();
    }

    /// Nets this node needs fan-out for.
    pub fn listened_nets(&self) -> BTreeSet<NetId> {
        self.driver.listened_nets()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phases
    // ═══════════════════════════════════════════════════════════════════════

    pub fn initialise_models(&mut self) -> EventReport {
        self.driver.initialise_models()
    }

    pub fn propagate_inputs(
        &mut self,
        moment: Moment,
        values: &BTreeMap<NetId, Signal>,
    ) -> Result<(), NetlistError> {
        self.driver.propagate_inputs(moment, values)
    }

    pub fn propagate_outputs<P>(
        &mut self,
        moment: Moment,
        nets: &BTreeSet<NetId>,
        propagator: &mut P,
    ) -> Result<BTreeMap<NetId, Signal>, NetlistError>
    where
        P: NetPropagator + ?Sized,
    {
        self.driver.propagate_outputs(moment, nets, propagator)
    }

    pub fn update_models(&mut self, moment: Moment) -> Result<EventReport, NetlistError> {
        self.driver.update_models(moment)
    }

    /// Queue a fanned-out value for the next input propagation.
    ///
    /// Values this node published itself are ignored. Returns whether the
    /// value was queued.
    pub fn accept_fanout(&mut self, fanout: ScheduleNetValue) -> bool {
        if fanout.source == self.config.name {
            trace!(net = %fanout.net, "Ignoring own fan-out");
            return false;
        }
        let queued = self
            .driver
            .schedule_remote(fanout.net.clone(), fanout.source.clone(), fanout.value);
        if queued {
            debug!(net = %fanout.net, source = %fanout.source, value = %fanout.value, "Fan-out queued");
        }
        queued
    }
}
