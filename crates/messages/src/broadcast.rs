//! Control messages sent to every node at once.

use crate::NetworkMessage;
use serde::{Deserialize, Serialize};

/// A broadcast on the shared control channel. None of these are answered on
/// the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BroadcastMessage {
    /// Every node announces itself on the discovery channel.
    Enumerate,
    /// Every node drops its installed models and nets.
    Clear,
    /// Every node returns its models to their power-on state.
    Reset,
}

impl NetworkMessage for BroadcastMessage {
    fn message_type_id() -> &'static str {
        "broadcast"
    }
}
