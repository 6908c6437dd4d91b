//! Async task hosting one node on a [`MemoryBus`].

use crate::{BroadcastListener, BroadcastOutcome, BusPropagator, Node, NodeListener};
use netsim_messages::{decode, encode, ScheduleNetValue};
use netsim_network::{BusError, InboundRequest, MemoryBus, NodeEndpoint, Transport};
use netsim_types::{NetId, NodeName};
use std::collections::BTreeSet;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, info_span, trace, warn, Instrument};

/// Handle to a running node task.
///
/// Dropping the handle stops the node.
#[derive(Debug)]
pub struct NodeHandle {
    name: NodeName,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Node>,
}

impl NodeHandle {
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Stop the task and hand back the node it owned.
    pub async fn stop(self) -> Result<Node, JoinError> {
        // The task may already have exited on its own.
        let _ = self.shutdown.send(());
        self.task.await
    }

    /// Kill the task without letting it finish its current message.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Register `node` on `bus` and run it on a new task.
pub fn spawn_node(bus: MemoryBus, node: Node) -> Result<NodeHandle, BusError> {
    let name = node.name().clone();
    let endpoint = bus.register_node(name.clone())?;
    let (shutdown, shutdown_rx) = oneshot::channel();
    let runner = NodeRunner {
        node,
        listener: NodeListener::new(),
        broadcasts: BroadcastListener,
        bus,
        subscribed: BTreeSet::new(),
    };
    let span = info_span!("node", name = %name);
    let task = tokio::spawn(runner.run(endpoint, shutdown_rx).instrument(span));
    Ok(NodeHandle {
        name,
        shutdown,
        task,
    })
}

struct NodeRunner {
    node: Node,
    listener: NodeListener,
    broadcasts: BroadcastListener,
    bus: MemoryBus,
    /// Nets the bus currently delivers fan-out for.
    subscribed: BTreeSet<NetId>,
}

impl NodeRunner {
    /// Serve the node's channels until shutdown.
    ///
    /// Fan-out is drained before broadcasts, and broadcasts before requests,
    /// so values published in one round are queued before the next phase
    /// request is handled.
    async fn run(mut self, mut endpoint: NodeEndpoint, mut shutdown: oneshot::Receiver<()>) -> Node {
        info!(capacity = self.node.capacity(), "Node started");
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!("Shutdown requested");
                    break;
                }

                Some(payload) = endpoint.nets.recv() => {
                    self.on_fanout(&payload);
                }

                Some(payload) = endpoint.broadcasts.recv() => {
                    self.on_broadcast(&payload);
                }

                Some(request) = endpoint.requests.recv() => {
                    self.on_request(request);
                }

                else => {
                    debug!("All channels closed");
                    break;
                }
            }
        }
        self.bus.deregister_node(self.node.name());
        info!("Node stopped");
        self.node
    }

    fn on_fanout(&mut self, payload: &[u8]) {
        match decode::<ScheduleNetValue>(payload) {
            Ok(fanout) => {
                // Queued values change what the next phase request does.
                if self.node.accept_fanout(fanout) {
                    self.listener.invalidate();
                }
            }
            Err(e) => warn!(error = %e, "Dropping malformed fan-out"),
        }
    }

    fn on_broadcast(&mut self, payload: &[u8]) {
        match self.broadcasts.handle_payload(&mut self.node, payload) {
            BroadcastOutcome::Announce(enumerated) => match encode(&enumerated) {
                Ok(bytes) => self.bus.announce(bytes),
                Err(e) => warn!(error = %e, "Failed to encode announcement"),
            },
            BroadcastOutcome::Cleared => {
                self.bus.unsubscribe_all(self.node.name());
                self.subscribed.clear();
                self.listener.invalidate();
            }
            BroadcastOutcome::Reset => self.listener.invalidate(),
            BroadcastOutcome::Dropped => {}
        }
    }

    fn on_request(&mut self, request: InboundRequest) {
        let name = self.node.name().clone();
        let mut propagator = BusPropagator::new(&self.bus, name);
        let reply = self
            .listener
            .handle_payload(&mut self.node, &mut propagator, &request.payload);
        self.sync_subscriptions();
        if request.reply.send(reply).is_err() {
            trace!("Requester went away before the reply");
        }
    }

    /// Subscribe to every listened net not yet subscribed.
    fn sync_subscriptions(&mut self) {
        for net in self.node.listened_nets() {
            if self.subscribed.insert(net.clone()) {
                self.bus.subscribe_net(self.node.name(), net);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeConfig;
    use netsim_messages::{
        BroadcastMessage, Enumerated, InitialiseModels, InstallModel, NodeReply, NodeRequest,
        PropagateInputs, SimpleAck,
    };
    use netsim_models::builtin_catalog;
    use netsim_test_helpers::bindings;
    use netsim_types::{Moment, ScheduledValue, Signal, UnitId};

    fn start(bus: &MemoryBus, name: &str) -> NodeHandle {
        let node = Node::new(NodeConfig::new(name), builtin_catalog().unwrap());
        spawn_node(bus.clone(), node).unwrap()
    }

    async fn request(bus: &MemoryBus, node: &str, request: NodeRequest) -> NodeReply {
        let rx = bus
            .request(&NodeName::new(node), encode(&request).unwrap())
            .unwrap();
        decode(&rx.await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_install_subscribes_listened_nets() {
        let bus = MemoryBus::new();
        let handle = start(&bus, "n0");

        let reply = request(
            &bus,
            "n0",
            InstallModel::new(
                "and2",
                UnitId::new("g"),
                "g",
                bindings(&[("a", "A"), ("b", "B"), ("q", "C")]),
            )
            .into(),
        )
        .await;
        assert_eq!(reply, NodeReply::SimpleAck(SimpleAck {}));
        assert!(bus.subscribers(&NetId::new("A")).contains(&NodeName::new("n0")));
        assert!(bus.subscribers(&NetId::new("C")).is_empty());

        let node = handle.stop().await.unwrap();
        assert_eq!(node.driver().devices().count(), 1);
        assert!(bus.nodes().is_empty());
    }

    #[tokio::test]
    async fn test_enumerate_and_clear_broadcasts() {
        let bus = MemoryBus::new();
        let mut discovery = bus.subscribe_discovery();
        let handle = start(&bus, "n0");
        request(
            &bus,
            "n0",
            InstallModel::new("not", UnitId::new("i"), "i", bindings(&[("a", "A")])).into(),
        )
        .await;

        bus.broadcast(encode(&BroadcastMessage::Enumerate).unwrap());
        let announced = decode::<Enumerated>(&discovery.recv().await.unwrap()).unwrap();
        assert_eq!(announced, Enumerated::new(NodeName::new("n0"), 1));

        bus.broadcast(encode(&BroadcastMessage::Clear).unwrap());
        // Served only after the queued broadcast.
        request(&bus, "n0", InitialiseModels::new().into()).await;
        let node = handle.stop().await.unwrap();
        assert_eq!(node.driver().devices().count(), 0);
        assert!(bus.subscribers(&NetId::new("A")).is_empty());
    }

    #[tokio::test]
    async fn test_fanout_reaches_listening_node() {
        let bus = MemoryBus::new();
        let handle = start(&bus, "n1");
        request(
            &bus,
            "n1",
            InstallModel::new("buffer", UnitId::new("b"), "b", bindings(&[("a", "A")])).into(),
        )
        .await;

        let value = ScheduledValue::new(Signal::One, Moment(0));
        let payload =
            encode(&ScheduleNetValue::new(NetId::new("A"), NodeName::new("n0"), value)).unwrap();
        assert_eq!(bus.publish_net(&NetId::new("A"), payload), 1);

        // Any later request is served after the queued fan-out.
        request(
            &bus,
            "n1",
            InstallModel::new("not", UnitId::new("i"), "i", Default::default()).into(),
        )
        .await;
        let node = handle.stop().await.unwrap();
        assert_eq!(node.driver().pending_remote(), 1);
    }

    #[tokio::test]
    async fn test_fanout_between_identical_requests_is_applied() {
        let bus = MemoryBus::new();
        let handle = start(&bus, "n1");
        request(
            &bus,
            "n1",
            InstallModel::new("buffer", UnitId::new("b"), "b", bindings(&[("a", "A")])).into(),
        )
        .await;

        let inputs: NodeRequest = PropagateInputs::new(Moment(0), Default::default()).into();
        request(&bus, "n1", inputs.clone()).await;

        let value = ScheduledValue::new(Signal::One, Moment(0));
        let payload =
            encode(&ScheduleNetValue::new(NetId::new("A"), NodeName::new("n0"), value)).unwrap();
        assert_eq!(bus.publish_net(&NetId::new("A"), payload), 1);

        // Same request again: the queued value must be applied, not skipped.
        let reply = request(&bus, "n1", inputs).await;
        assert_eq!(reply, NodeReply::SimpleAck(SimpleAck {}));

        let node = handle.stop().await.unwrap();
        assert_eq!(node.driver().pending_remote(), 0);
        assert_eq!(
            node.driver().net(&NetId::new("A")).unwrap().current_value(),
            Signal::One
        );
    }
}
