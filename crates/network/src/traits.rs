//! Transport trait for payload delivery.
//!
//! Payloads are already-encoded messages; the transport never inspects them.

use netsim_types::{NetId, NodeName};
use tokio::sync::oneshot;

/// Error returned when a payload cannot be handed to its destination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("No node registered as {0}")]
    UnknownNode(NodeName),
    #[error("{0} stopped receiving")]
    NodeGone(NodeName),
    #[error("{0} is already registered")]
    DuplicateNode(NodeName),
}

/// Message delivery between the coordinator and nodes.
///
/// All sends are fire-and-forget except [`request`](Self::request), whose
/// reply arrives on the returned receiver. Delivery is at-least-once from the
/// caller's point of view: a caller that times out may send the same payload
/// again.
pub trait Transport: Send + Sync {
    /// Send a payload to one node's private request channel.
    fn request(&self, node: &NodeName, payload: Vec<u8>)
        -> Result<oneshot::Receiver<Vec<u8>>, BusError>;

    /// Send a payload to every registered node's broadcast channel.
    ///
    /// Returns how many nodes it was delivered to.
    fn broadcast(&self, payload: Vec<u8>) -> usize;

    /// Send a payload to every node subscribed to `net`.
    ///
    /// Returns how many nodes it was delivered to.
    fn publish_net(&self, net: &NetId, payload: Vec<u8>) -> usize;

    /// Send a payload to every discovery listener.
    fn announce(&self, payload: Vec<u8>);
}
