//! Control broadcast handling.

use crate::Node;
use netsim_messages::{decode, BroadcastMessage, Enumerated};
use tracing::{debug, warn};

/// What the runner has to do after a broadcast was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Send this announcement on the discovery channel.
    Announce(Enumerated),
    /// The partition was emptied; drop all net subscriptions.
    Cleared,
    /// Model state was reset.
    Reset,
    /// The payload was not a broadcast and was dropped.
    Dropped,
}

/// Applies Enumerate/Clear/Reset to a node. Broadcasts are never answered on
/// the request path.
#[derive(Debug, Default, Clone, Copy)]
pub struct BroadcastListener;

impl BroadcastListener {
    pub fn handle_payload(&self, node: &mut Node, payload: &[u8]) -> BroadcastOutcome {
        match decode::<BroadcastMessage>(payload) {
            Ok(message) => self.handle(node, message),
            Err(e) => {
                warn!(node = %node.name(), error = %e, "Dropping malformed broadcast");
                BroadcastOutcome::Dropped
            }
        }
    }

    pub fn handle(&self, node: &mut Node, message: BroadcastMessage) -> BroadcastOutcome {
        debug!(node = %node.name(), ?message, "Broadcast received");
        match message {
            BroadcastMessage::Enumerate => {
                BroadcastOutcome::Announce(Enumerated::new(node.name().clone(), node.capacity()))
            }
            BroadcastMessage::Clear => {
                node.clear();
                BroadcastOutcome::Cleared
            }
            BroadcastMessage::Reset => {
                node.reset();
                BroadcastOutcome::Reset
            }
        }
    }
}
