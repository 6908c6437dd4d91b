//! The per-node phase engine.

use crate::Schedule;
use indexmap::IndexMap;
use netsim_core::{
    Device, Direction, DriverId, Net, NetPropagator, NetlistError, OutputEvent,
};
use netsim_types::{Moment, NetId, NodeName, ScheduledValue, Signal, UnitId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// Net id → moments at which new values were scheduled for it.
pub type EventReport = BTreeMap<NetId, BTreeSet<Moment>>;

/// Owns one node's partition of devices and nets and runs the simulation
/// phases over it.
///
/// Per moment the phases are invoked in a fixed order:
///
/// 1. [`propagate_inputs`](Self::propagate_inputs): apply due remote fan-out
///    and coordinator values to nets, pushing changes into input pins.
/// 2. [`propagate_outputs`](Self::propagate_outputs): apply due local output
///    values to nets and announce each locally driven net's value.
/// 3. [`update_models`](Self::update_models): evaluate devices whose inputs
///    changed and report the resulting scheduled values.
///
/// The sequence may repeat at the same moment (delta rounds) but never moves
/// backwards. [`initialise_models`](Self::initialise_models) runs once before
/// the first moment.
///
/// Only entry into a moment is enforced: `propagate_outputs` and
/// `update_models` fail with `PhaseOutOfOrder` unless inputs were propagated
/// for that moment. Between those two no order is imposed. Outputs are
/// requested only for nets with due events, so a round may skip
/// `propagate_outputs`, and outputs scheduled by `update_models` at the
/// current moment may be announced before the next round's inputs.
///
/// Every fallible operation validates before it mutates, so an error leaves
/// the partition untouched.
#[derive(Debug, Default)]
pub struct NetlistDriver {
    devices: IndexMap<UnitId, Device>,
    nets: BTreeMap<NetId, Net>,
    /// Devices with an input change not yet evaluated.
    dirty: BTreeSet<UnitId>,
    /// Values produced by local output pins.
    outputs: Schedule,
    /// Values received from other nodes by fan-out.
    remote: Schedule,
    /// Last moment inputs were propagated for.
    current: Option<Moment>,
}

impl NetlistDriver {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Topology
    // ═══════════════════════════════════════════════════════════════════════

    /// Install a device and bind its pins, creating nets as needed.
    ///
    /// Nothing is installed or bound unless every binding is valid.
    pub fn install(
        &mut self,
        device: Device,
        bindings: &BTreeMap<String, NetId>,
    ) -> Result<(), NetlistError> {
        if self.devices.contains_key(device.unit()) {
            return Err(NetlistError::DuplicateUnitId(device.unit().clone()));
        }
        for (pin, net) in bindings {
            device.check_connect(pin, net)?;
        }

        let unit = device.unit().clone();
        debug!(unit = %unit, kind = device.kind(), pins = bindings.len(), "Installing device");
        self.devices.insert(unit.clone(), device);
        for (pin, net) in bindings {
            self.connect_pin(&unit, pin, net.clone())?;
        }
        Ok(())
    }

    /// Bind one pin of an installed device to a net.
    ///
    /// A newly bound input picks up the net's current value. A newly bound
    /// output contributes whatever its device last produced.
    pub fn connect_pin(
        &mut self,
        unit: &UnitId,
        pin: &str,
        net_id: NetId,
    ) -> Result<(), NetlistError> {
        let device = self
            .devices
            .get_mut(unit)
            .ok_or_else(|| NetlistError::UnknownUnit(unit.clone()))?;
        let direction = device.check_connect(pin, &net_id)?;
        let pin_id = device.pin_id(pin);

        let net = self
            .nets
            .entry(net_id.clone())
            .or_insert_with(|| Net::new(net_id.clone()));
        match direction {
            Direction::Input => net.add_listener(pin_id.clone())?,
            Direction::Output => net.add_driver(pin_id.clone())?,
        }
        device.connect(pin, net_id.clone())?;

        match direction {
            Direction::Input => {
                if device.set_input(pin, net.current_value()) {
                    self.dirty.insert(unit.clone());
                }
            }
            Direction::Output => {
                let produced = device.pin(pin)?.value();
                if produced != Signal::Floating {
                    let resolution = net.apply_driver_values([(DriverId::Pin(pin_id), produced)]);
                    if resolution.changed {
                        deliver(net, &mut self.devices, &mut self.dirty);
                    }
                }
            }
        }
        trace!(unit = %unit, pin, net = %net_id, ?direction, "Pin connected");
        Ok(())
    }

    /// Remove every device and net and forget all simulation state.
    pub fn clear(&mut self) {
        debug!(devices = self.devices.len(), nets = self.nets.len(), "Clearing partition");
        *self = Self::default();
    }

    /// Return every device, pin and net to its power-on state, keeping the
    /// topology. The driver accepts any moment afterwards.
    pub fn reset(&mut self) {
        debug!(devices = self.devices.len(), "Resetting partition");
        for device in self.devices.values_mut() {
            device.reset();
        }
        for net in self.nets.values_mut() {
            net.reset();
        }
        self.dirty.clear();
        self.outputs.clear();
        self.remote.clear();
        self.current = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phases
    // ═══════════════════════════════════════════════════════════════════════

    /// Evaluate every device once against its current inputs.
    ///
    /// Unbound and undriven inputs read as floating. Returns the nets that
    /// received scheduled values and when.
    pub fn initialise_models(&mut self) -> EventReport {
        let moment = self.current.unwrap_or_default();
        self.dirty.clear();
        let units: Vec<UnitId> = self.devices.keys().cloned().collect();
        let report = self.evaluate_units(units, moment);
        debug!(%moment, devices = self.devices.len(), nets = report.len(), "Initialised models");
        report
    }

    /// Apply external driver values for `moment`.
    ///
    /// Remote fan-out values due by `moment` are applied to their source
    /// node's slot; `values` are applied to the coordinator slot. Input pins
    /// of every net whose resolution changed are updated.
    pub fn propagate_inputs(
        &mut self,
        moment: Moment,
        values: &BTreeMap<NetId, Signal>,
    ) -> Result<(), NetlistError> {
        if let Some(current) = self.current {
            if moment < current {
                return Err(NetlistError::MomentRegression {
                    requested: moment,
                    current,
                });
            }
        }
        if let Some(unknown) = values.keys().find(|net| !self.nets.contains_key(*net)) {
            return Err(NetlistError::UnknownNet(unknown.clone()));
        }
        self.current = Some(moment);

        let mut updates: BTreeMap<NetId, Vec<(DriverId, Signal)>> = BTreeMap::new();
        for pending in self.remote.drain_due(moment, |_| true) {
            updates
                .entry(pending.net)
                .or_default()
                .push((pending.driver, pending.signal));
        }
        for (net, signal) in values {
            updates
                .entry(net.clone())
                .or_default()
                .push((DriverId::Coordinator, *signal));
        }

        let changed = self.apply(updates);
        trace!(%moment, inputs = values.len(), changed, "Propagated inputs");
        Ok(())
    }

    /// Apply due local output values on `nets` and announce their values.
    ///
    /// For each requested net with a local driver, the resolution of the
    /// local drivers alone is handed to `propagator` and returned. Requested
    /// nets without local drivers are skipped. Propagation failures are
    /// logged, not retried.
    pub fn propagate_outputs<P>(
        &mut self,
        moment: Moment,
        nets: &BTreeSet<NetId>,
        propagator: &mut P,
    ) -> Result<BTreeMap<NetId, Signal>, NetlistError>
    where
        P: NetPropagator + ?Sized,
    {
        self.expect_current("propagate_outputs", moment)?;
        if let Some(unknown) = nets.iter().find(|net| !self.nets.contains_key(*net)) {
            return Err(NetlistError::UnknownNet(unknown.clone()));
        }

        let mut updates: BTreeMap<NetId, Vec<(DriverId, Signal)>> = BTreeMap::new();
        for pending in self.outputs.drain_due(moment, |v| nets.contains(&v.net)) {
            updates
                .entry(pending.net)
                .or_default()
                .push((pending.driver, pending.signal));
        }
        self.apply(updates);

        let mut driven = BTreeMap::new();
        for net_id in nets {
            let Some(net) = self.nets.get(net_id) else {
                continue;
            };
            if !net.has_local_drivers() {
                continue;
            }
            let value = net.local_value();
            if let Err(e) = propagator.propagate(net_id, ScheduledValue::new(value, moment)) {
                warn!(net = %net_id, %moment, error = %e, "Fan-out failed");
            }
            driven.insert(net_id.clone(), value);
        }
        trace!(%moment, requested = nets.len(), driven = driven.len(), "Propagated outputs");
        Ok(driven)
    }

    /// Evaluate every device whose inputs changed since it last ran.
    ///
    /// Requires inputs for `moment`; see the type docs for why it does not
    /// also require `propagate_outputs`. Returns the scheduled values grouped
    /// by net.
    pub fn update_models(&mut self, moment: Moment) -> Result<EventReport, NetlistError> {
        self.expect_current("update_models", moment)?;
        let units: Vec<UnitId> = std::mem::take(&mut self.dirty).into_iter().collect();
        let evaluated = units.len();
        let report = self.evaluate_units(units, moment);
        trace!(%moment, evaluated, nets = report.len(), "Updated models");
        Ok(report)
    }

    /// Queue a value fanned out by `source` for the next input propagation.
    ///
    /// Returns false if `net` is not part of this partition.
    pub fn schedule_remote(&mut self, net: NetId, source: NodeName, value: ScheduledValue) -> bool {
        if !self.nets.contains_key(&net) {
            trace!(net = %net, %source, "Ignoring fan-out for unknown net");
            return false;
        }
        self.remote
            .push(net, DriverId::Remote(source), value.signal, value.moment);
        true
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn current_moment(&self) -> Option<Moment> {
        self.current
    }

    pub fn device(&self, unit: &UnitId) -> Option<&Device> {
        self.devices.get(unit)
    }

    /// Installed devices in install order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn net(&self, id: &NetId) -> Option<&Net> {
        self.nets.get(id)
    }

    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    /// Nets with at least one local input pin.
    pub fn listened_nets(&self) -> BTreeSet<NetId> {
        self.nets
            .values()
            .filter(|n| n.has_listeners())
            .map(|n| n.id().clone())
            .collect()
    }

    /// Nets with at least one local output pin.
    pub fn driven_nets(&self) -> BTreeSet<NetId> {
        self.nets
            .values()
            .filter(|n| n.has_local_drivers())
            .map(|n| n.id().clone())
            .collect()
    }

    /// Local output values not yet applied to their nets.
    pub fn pending_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Remote values not yet applied to their nets.
    pub fn pending_remote(&self) -> usize {
        self.remote.len()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════

    fn expect_current(&self, phase: &'static str, moment: Moment) -> Result<(), NetlistError> {
        if self.current == Some(moment) {
            Ok(())
        } else {
            Err(NetlistError::PhaseOutOfOrder {
                phase,
                moment,
                current: self.current,
            })
        }
    }

    /// Apply driver updates net by net. Returns how many nets changed value.
    fn apply(&mut self, updates: BTreeMap<NetId, Vec<(DriverId, Signal)>>) -> usize {
        let mut changed = 0;
        for (net_id, values) in updates {
            let Some(net) = self.nets.get_mut(&net_id) else {
                continue;
            };
            let resolution = net.apply_driver_values(values);
            if resolution.changed {
                trace!(net = %net_id, value = %resolution.value, "Net changed");
                deliver(net, &mut self.devices, &mut self.dirty);
                changed += 1;
            }
        }
        changed
    }

    fn evaluate_units(&mut self, units: Vec<UnitId>, moment: Moment) -> EventReport {
        let mut report = EventReport::new();
        for unit in units {
            let Some(device) = self.devices.get_mut(&unit) else {
                continue;
            };
            let events = device.evaluate(moment);
            for event in events {
                self.schedule_output(event, &mut report);
            }
        }
        report
    }

    fn schedule_output(&mut self, event: OutputEvent, report: &mut EventReport) {
        let Some(net) = event.net else {
            return;
        };
        report
            .entry(net.clone())
            .or_default()
            .insert(event.value.moment);
        self.outputs.push(
            net,
            DriverId::Pin(event.pin),
            event.value.signal,
            event.value.moment,
        );
    }
}

/// Push a net's resolved value into its listening pins, marking every device
/// whose input changed.
fn deliver(net: &Net, devices: &mut IndexMap<UnitId, Device>, dirty: &mut BTreeSet<UnitId>) {
    let value = net.current_value();
    for pin in net.listeners() {
        if let Some(device) = devices.get_mut(&pin.unit) {
            if device.set_input(&pin.pin, value) {
                dirty.insert(pin.unit.clone());
            }
        }
    }
}
