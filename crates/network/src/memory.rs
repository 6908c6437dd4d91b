//! In-process message bus backed by tokio channels.

use crate::{BusError, Transport};
use netsim_types::{NetId, NodeName};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// A request waiting to be answered by a node.
#[derive(Debug)]
pub struct InboundRequest {
    pub payload: Vec<u8>,
    /// Dropping this without sending tells the requester the node gave up.
    pub reply: oneshot::Sender<Vec<u8>>,
}

/// The receiving side of a node's three channels.
#[derive(Debug)]
pub struct NodeEndpoint {
    pub name: NodeName,
    pub requests: mpsc::UnboundedReceiver<InboundRequest>,
    pub broadcasts: mpsc::UnboundedReceiver<Vec<u8>>,
    pub nets: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub requests: u64,
    pub broadcasts: u64,
    pub net_publications: u64,
    pub net_deliveries: u64,
    pub announcements: u64,
}

#[derive(Debug)]
struct NodeSenders {
    requests: mpsc::UnboundedSender<InboundRequest>,
    broadcasts: mpsc::UnboundedSender<Vec<u8>>,
    nets: mpsc::UnboundedSender<Vec<u8>>,
}

#[derive(Debug, Default)]
struct BusState {
    nodes: BTreeMap<NodeName, NodeSenders>,
    subscriptions: BTreeMap<NetId, BTreeSet<NodeName>>,
    discovery: Vec<mpsc::UnboundedSender<Vec<u8>>>,
    stats: BusStats,
}

/// Shared in-memory bus. Cloning yields another handle to the same bus.
///
/// Each registered node gets a private request channel, a broadcast channel
/// and a net fan-out channel. Per-channel delivery is FIFO.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the channels for a node.
    pub fn register_node(&self, name: NodeName) -> Result<NodeEndpoint, BusError> {
        let mut state = self.state.lock();
        if state.nodes.contains_key(&name) {
            return Err(BusError::DuplicateNode(name));
        }
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (broadcasts_tx, broadcasts) = mpsc::unbounded_channel();
        let (nets_tx, nets) = mpsc::unbounded_channel();
        state.nodes.insert(
            name.clone(),
            NodeSenders {
                requests: requests_tx,
                broadcasts: broadcasts_tx,
                nets: nets_tx,
            },
        );
        debug!(node = %name, "Node registered on bus");
        Ok(NodeEndpoint {
            name,
            requests,
            broadcasts,
            nets,
        })
    }

    /// Remove a node and all of its subscriptions.
    pub fn deregister_node(&self, name: &NodeName) -> bool {
        let mut state = self.state.lock();
        for subscribers in state.subscriptions.values_mut() {
            subscribers.remove(name);
        }
        state.subscriptions.retain(|_, s| !s.is_empty());
        state.nodes.remove(name).is_some()
    }

    /// Deliver future publications on `net` to `node`.
    pub fn subscribe_net(&self, node: &NodeName, net: NetId) {
        let mut state = self.state.lock();
        trace!(node = %node, net = %net, "Subscribed to net");
        state
            .subscriptions
            .entry(net)
            .or_default()
            .insert(node.clone());
    }

    /// Drop every net subscription held by `node`.
    pub fn unsubscribe_all(&self, node: &NodeName) {
        let mut state = self.state.lock();
        for subscribers in state.subscriptions.values_mut() {
            subscribers.remove(node);
        }
        state.subscriptions.retain(|_, s| !s.is_empty());
    }

    /// Nodes currently subscribed to `net`.
    pub fn subscribers(&self, net: &NetId) -> BTreeSet<NodeName> {
        self.state
            .lock()
            .subscriptions
            .get(net)
            .cloned()
            .unwrap_or_default()
    }

    /// Open a discovery listener.
    pub fn subscribe_discovery(&self) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().discovery.push(tx);
        rx
    }

    /// Registered node names.
    pub fn nodes(&self) -> Vec<NodeName> {
        self.state.lock().nodes.keys().cloned().collect()
    }

    pub fn stats(&self) -> BusStats {
        self.state.lock().stats
    }
}

impl Transport for MemoryBus {
    fn request(
        &self,
        node: &NodeName,
        payload: Vec<u8>,
    ) -> Result<oneshot::Receiver<Vec<u8>>, BusError> {
        let mut state = self.state.lock();
        let senders = state
            .nodes
            .get(node)
            .ok_or_else(|| BusError::UnknownNode(node.clone()))?;
        let (reply, rx) = oneshot::channel();
        senders
            .requests
            .send(InboundRequest { payload, reply })
            .map_err(|_| BusError::NodeGone(node.clone()))?;
        state.stats.requests += 1;
        Ok(rx)
    }

    fn broadcast(&self, payload: Vec<u8>) -> usize {
        let mut state = self.state.lock();
        let delivered = state
            .nodes
            .values()
            .filter(|s| s.broadcasts.send(payload.clone()).is_ok())
            .count();
        state.stats.broadcasts += 1;
        trace!(delivered, "Broadcast sent");
        delivered
    }

    fn publish_net(&self, net: &NetId, payload: Vec<u8>) -> usize {
        let mut state = self.state.lock();
        let Some(subscribers) = state.subscriptions.get(net) else {
            state.stats.net_publications += 1;
            return 0;
        };
        let delivered = subscribers
            .iter()
            .filter_map(|name| state.nodes.get(name))
            .filter(|s| s.nets.send(payload.clone()).is_ok())
            .count();
        state.stats.net_publications += 1;
        state.stats.net_deliveries += delivered as u64;
        trace!(net = %net, delivered, "Net value published");
        delivered
    }

    fn announce(&self, payload: Vec<u8>) {
        let mut state = self.state.lock();
        state.discovery.retain(|tx| tx.send(payload.clone()).is_ok());
        state.stats.announcements += 1;
    }
}
