//! Drives every node through the simulation phases, moment by moment.

use crate::{Circuit, CoordinatorConfig, CoordinatorError, DeviceSpec, EventQueue, Stimulus, Waveform};
use futures::future::try_join_all;
use netsim_core::{Direction, ModelCatalog, NetlistError};
use netsim_messages::{
    decode, encode, BroadcastMessage, Enumerated, FromReply, InitialiseModels, InstallModel,
    NodeReply, NodeRequest, PropagateInputs, PropagateOutputs, Request, UpdateModels,
};
use netsim_network::Transport;
use netsim_types::{resolve, Moment, NetId, NodeName, Signal, UnitId};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, trace, warn};

/// What the coordinator knows about one node's partition.
#[derive(Debug, Clone, Default)]
struct NodePlan {
    capacity: u32,
    units: u32,
    /// Every net bound on this node.
    nets: BTreeSet<NetId>,
    /// Nets with an output pin on this node.
    driven: BTreeSet<NetId>,
}

impl NodePlan {
    fn new(capacity: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            ..Self::default()
        }
    }
}

/// Outcome of simulating one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub moment: Moment,
    /// Phase rounds needed for the moment to settle.
    pub rounds: u32,
}

/// Outcome of [`Coordinator::run_until`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub moments: u32,
    pub rounds: u32,
    pub last_moment: Option<Moment>,
}

/// Sequences the phases across a cluster of nodes.
///
/// Each moment is simulated in rounds. A round sends, to every node in
/// parallel:
///
/// 1. `PropagateInputs`, carrying stimulus values on the first round only.
/// 2. `PropagateOutputs` for the nets each node reported events on.
/// 3. `UpdateModels`, whose reports feed the event queue.
///
/// Rounds repeat at the same moment while values were published or events
/// are due at that moment. Fan-out published in one round is absorbed by the
/// receivers' next `PropagateInputs`.
///
/// The recorded value of a net is the resolution of every node's local
/// contribution and any stimulus on it.
pub struct Coordinator<T: Transport> {
    transport: T,
    discovery: mpsc::UnboundedReceiver<Vec<u8>>,
    catalog: ModelCatalog,
    config: CoordinatorConfig,

    nodes: BTreeMap<NodeName, NodePlan>,
    placement: BTreeMap<UnitId, NodeName>,

    events: EventQueue,
    stimulus: Stimulus,
    /// Stimulus levels currently applied.
    forced: BTreeMap<NetId, Signal>,
    /// Last value each node reported for each net it drives.
    contributions: BTreeMap<NetId, BTreeMap<NodeName, Signal>>,
    waveform: Waveform,
    current: Option<Moment>,
}

impl<T: Transport> Coordinator<T> {
    /// `discovery` must receive the transport's announcements.
    pub fn new(
        transport: T,
        discovery: mpsc::UnboundedReceiver<Vec<u8>>,
        catalog: ModelCatalog,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            transport,
            discovery,
            catalog,
            config,
            nodes: BTreeMap::new(),
            placement: BTreeMap::new(),
            events: EventQueue::new(),
            stimulus: Stimulus::new(),
            forced: BTreeMap::new(),
            contributions: BTreeMap::new(),
            waveform: Waveform::new(),
            current: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cluster membership and topology
    // ═══════════════════════════════════════════════════════════════════════

    /// Broadcast `Enumerate` and collect announcements.
    ///
    /// Waits for the discovery timeout, or until `expected` nodes are known.
    pub async fn discover(&mut self, expected: Option<usize>) -> Result<Vec<NodeName>, CoordinatorError> {
        let reached = self.transport.broadcast(encode(&BroadcastMessage::Enumerate)?);
        let deadline = Instant::now() + self.config.discovery_timeout;

        while expected.map_or(true, |n| self.nodes.len() < n) {
            let payload = match timeout_at(deadline, self.discovery.recv()).await {
                Ok(Some(payload)) => payload,
                Ok(None) | Err(_) => break,
            };
            match decode::<Enumerated>(&payload) {
                Ok(announced) => {
                    debug!(node = %announced.name, capacity = announced.capacity, "Node discovered");
                    self.nodes
                        .entry(announced.name)
                        .and_modify(|plan| plan.capacity = announced.capacity.max(1))
                        .or_insert_with(|| NodePlan::new(announced.capacity));
                }
                Err(e) => warn!(error = %e, "Dropping malformed announcement"),
            }
        }

        if self.nodes.is_empty() {
            return Err(CoordinatorError::NoNodes);
        }
        info!(nodes = self.nodes.len(), reached, "Discovery finished");
        Ok(self.nodes.keys().cloned().collect())
    }

    /// Install a device on its pinned node, or on the least loaded node
    /// relative to capacity.
    pub async fn install(&mut self, device: &DeviceSpec) -> Result<NodeName, CoordinatorError> {
        if self.placement.contains_key(&device.unit) {
            return Err(CoordinatorError::DuplicateUnit(device.unit.clone()));
        }
        let pins = self.catalog.create(&device.selector)?.pins();
        let mut driven = BTreeSet::new();
        for (pin, net) in &device.pins {
            let spec = pins
                .iter()
                .find(|spec| spec.name == *pin)
                .ok_or_else(|| NetlistError::UnknownPin {
                    unit: device.unit.clone(),
                    pin: pin.clone(),
                })?;
            if spec.direction == Direction::Output {
                driven.insert(net.clone());
            }
        }
        let node = self.place(device.node.as_ref())?;

        let request = InstallModel::new(
            device.selector.as_str(),
            device.unit.clone(),
            device.display_name(),
            device.pins.clone(),
        );
        call(&self.transport, &self.config, &node, request).await?;

        if let Some(plan) = self.nodes.get_mut(&node) {
            plan.units += 1;
            plan.nets.extend(device.pins.values().cloned());
            plan.driven.extend(driven);
        }
        self.placement.insert(device.unit.clone(), node.clone());
        info!(unit = %device.unit, selector = %device.selector, node = %node, "Device placed");
        Ok(node)
    }

    /// Install every device of `circuit` and adopt its stimulus.
    pub async fn load(&mut self, circuit: &Circuit) -> Result<(), CoordinatorError> {
        for device in &circuit.devices {
            self.install(device).await?;
        }
        for (at, net, value) in circuit.stimulus.iter() {
            self.stimulus.insert(at, net.clone(), value);
        }
        info!(
            devices = circuit.devices.len(),
            stimulus = circuit.stimulus.len(),
            "Circuit loaded"
        );
        Ok(())
    }

    /// Drive `net` to `value` from `at` on.
    pub fn add_stimulus(&mut self, at: Moment, net: NetId, value: Signal) {
        self.stimulus.insert(at, net, value);
    }

    fn place(&self, requested: Option<&NodeName>) -> Result<NodeName, CoordinatorError> {
        if let Some(node) = requested {
            return if self.nodes.contains_key(node) {
                Ok(node.clone())
            } else {
                Err(CoordinatorError::UnknownNode(node.clone()))
            };
        }
        // Lowest units/capacity; ties go to the first name.
        self.nodes
            .iter()
            .min_by(|(_, a), (_, b)| {
                (u64::from(a.units) * u64::from(b.capacity))
                    .cmp(&(u64::from(b.units) * u64::from(a.capacity)))
            })
            .map(|(name, _)| name.clone())
            .ok_or(CoordinatorError::NoNodes)
    }

    /// Return every node to its power-on state and forget the run so far.
    ///
    /// Placement and stimulus are kept; call [`initialise`](Self::initialise)
    /// before stepping again.
    pub fn reset(&mut self) -> Result<(), CoordinatorError> {
        let reached = self.transport.broadcast(encode(&BroadcastMessage::Reset)?);
        self.forget_run();
        info!(reached, "Cluster reset");
        Ok(())
    }

    /// Remove every device from every node.
    pub fn clear(&mut self) -> Result<(), CoordinatorError> {
        let reached = self.transport.broadcast(encode(&BroadcastMessage::Clear)?);
        self.forget_run();
        self.placement.clear();
        self.stimulus = Stimulus::new();
        for plan in self.nodes.values_mut() {
            *plan = NodePlan::new(plan.capacity);
        }
        info!(reached, "Cluster cleared");
        Ok(())
    }

    fn forget_run(&mut self) {
        self.events.clear();
        self.forced.clear();
        self.contributions.clear();
        self.waveform.clear();
        self.current = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Simulation
    // ═══════════════════════════════════════════════════════════════════════

    /// Run every node's initial evaluation and queue the resulting events.
    pub async fn initialise(&mut self) -> Result<(), CoordinatorError> {
        let requests = self
            .nodes
            .keys()
            .map(|node| (node.clone(), InitialiseModels::new()))
            .collect();
        let replies = self.call_all(requests).await?;
        for (node, queue) in &replies {
            self.events.merge(node, &queue.events);
        }
        info!(nodes = replies.len(), pending = self.events.len(), "Models initialised");
        Ok(())
    }

    /// Simulate `moment` until it settles.
    pub async fn step(&mut self, moment: Moment) -> Result<StepReport, CoordinatorError> {
        if let Some(current) = self.current {
            if moment < current {
                return Err(NetlistError::MomentRegression {
                    requested: moment,
                    current,
                }
                .into());
            }
        }
        self.current = Some(moment);

        let applied = self.stimulus.at(moment).cloned().unwrap_or_default();
        self.forced.extend(applied.iter().map(|(net, v)| (net.clone(), *v)));
        let mut touched: BTreeSet<NetId> = applied.keys().cloned().collect();

        let mut rounds = 0;
        loop {
            if rounds == self.config.max_delta_rounds {
                warn!(%moment, rounds, "Moment did not settle");
                return Err(CoordinatorError::DeltaCycleLimit { moment, rounds });
            }
            rounds += 1;

            let inputs = self
                .nodes
                .iter()
                .map(|(node, plan)| {
                    let values = if rounds == 1 {
                        applied
                            .iter()
                            .filter(|(net, _)| plan.nets.contains(*net))
                            .map(|(net, v)| (net.clone(), *v))
                            .collect()
                    } else {
                        BTreeMap::new()
                    };
                    (node.clone(), PropagateInputs::new(moment, values))
                })
                .collect();
            self.call_all(inputs).await?;

            let due = self.events.take_due(moment);
            let outputs = due
                .into_iter()
                .filter_map(|(node, nets)| {
                    let plan = self.nodes.get(&node)?;
                    let nets: BTreeSet<NetId> = nets.intersection(&plan.driven).cloned().collect();
                    (!nets.is_empty()).then(|| (node, PropagateOutputs::new(moment, nets)))
                })
                .collect();
            let driven = self.call_all(outputs).await?;
            let mut published = false;
            for (node, reply) in driven {
                for (net, value) in reply.drivers {
                    self.contributions
                        .entry(net.clone())
                        .or_default()
                        .insert(node.clone(), value);
                    touched.insert(net);
                    published = true;
                }
            }

            let updates = self
                .nodes
                .keys()
                .map(|node| (node.clone(), UpdateModels::new(moment)))
                .collect();
            let reports = self.call_all(updates).await?;
            for (node, queue) in &reports {
                self.events.merge(node, &queue.events);
            }

            for net in std::mem::take(&mut touched) {
                let value = self.value(&net);
                if self.waveform.record(&net, moment, value) {
                    trace!(net = %net, %moment, %value, "Net changed");
                }
            }

            if !published && !self.events.has_events_at(moment) {
                break;
            }
        }
        debug!(%moment, rounds, pending = self.events.len(), "Moment settled");
        Ok(StepReport { moment, rounds })
    }

    /// The next moment with queued events or stimulus.
    pub fn next_moment(&self) -> Option<Moment> {
        let stimulus = self.stimulus.next_after(self.current);
        match (self.events.next_moment(), stimulus) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Step through every moment with activity up to and including `until`.
    pub async fn run_until(&mut self, until: Moment) -> Result<RunReport, CoordinatorError> {
        let mut report = RunReport::default();
        while let Some(moment) = self.next_moment().filter(|m| *m <= until) {
            let step = self.step(moment).await?;
            report.moments += 1;
            report.rounds += step.rounds;
            report.last_moment = Some(moment);
        }
        info!(moments = report.moments, rounds = report.rounds, %until, "Run finished");
        Ok(report)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolved value of `net` from every node's contribution and stimulus.
    pub fn value(&self, net: &NetId) -> Signal {
        let contributed = self
            .contributions
            .get(net)
            .into_iter()
            .flat_map(|by_node| by_node.values().copied());
        resolve(contributed.chain(self.forced.get(net).copied()))
    }

    /// What each node last reported driving onto `net`.
    pub fn contributions(&self, net: &NetId) -> BTreeMap<NodeName, Signal> {
        self.contributions.get(net).cloned().unwrap_or_default()
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    pub fn current_moment(&self) -> Option<Moment> {
        self.current
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.keys()
    }

    /// Node hosting `unit`.
    pub fn placement(&self, unit: &UnitId) -> Option<&NodeName> {
        self.placement.get(unit)
    }

    pub fn placements(&self) -> &BTreeMap<UnitId, NodeName> {
        &self.placement
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Requests
    // ═══════════════════════════════════════════════════════════════════════

    /// Send one request per node concurrently; fails on the first failure.
    async fn call_all<R: Request>(
        &self,
        requests: Vec<(NodeName, R)>,
    ) -> Result<Vec<(NodeName, R::Response)>, CoordinatorError> {
        let transport = &self.transport;
        let config = &self.config;
        try_join_all(requests.into_iter().map(|(node, request)| async move {
            let response = call(transport, config, &node, request).await?;
            Ok::<_, CoordinatorError>((node, response))
        }))
        .await
    }
}

/// Send a request and wait for its typed reply, retrying on timeout.
async fn call<T, R>(
    transport: &T,
    config: &CoordinatorConfig,
    node: &NodeName,
    request: R,
) -> Result<R::Response, CoordinatorError>
where
    T: Transport + ?Sized,
    R: Request,
{
    let request: NodeRequest = request.into();
    let phase = request.phase();
    let moment = request.moment();
    let payload = encode(&request)?;

    for attempt in 1..=config.attempts() {
        let reply = match transport.request(node, payload.clone()) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(node = %node, phase, attempt, error = %e, "Request not delivered");
                continue;
            }
        };
        match timeout(config.phase_timeout, reply).await {
            Ok(Ok(bytes)) => {
                let reply = decode::<NodeReply>(&bytes)?;
                return match R::Response::from_reply(reply) {
                    Ok(response) => Ok(response),
                    Err(NodeReply::Error(e)) => Err(CoordinatorError::NodeError {
                        node: node.clone(),
                        phase,
                        kind: e.kind,
                        message: e.message,
                    }),
                    Err(_) => Err(CoordinatorError::UnexpectedReply {
                        node: node.clone(),
                        phase,
                    }),
                };
            }
            Ok(Err(_)) => warn!(node = %node, phase, attempt, "Node dropped the request"),
            Err(_) => warn!(node = %node, phase, attempt, "Request timed out"),
        }
    }
    Err(CoordinatorError::NodeUnresponsive {
        node: node.clone(),
        phase,
        moment,
        attempts: config.attempts(),
    })
}
