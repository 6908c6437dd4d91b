//! Node announcements.

use crate::NetworkMessage;
use netsim_types::NodeName;
use serde::{Deserialize, Serialize};

/// A node's answer to [`BroadcastMessage::Enumerate`](crate::BroadcastMessage::Enumerate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerated {
    pub name: NodeName,
    /// Declared capacity, used for placement.
    pub capacity: u32,
}

impl Enumerated {
    pub fn new(name: NodeName, capacity: u32) -> Self {
        Self { name, capacity }
    }
}

impl NetworkMessage for Enumerated {
    fn message_type_id() -> &'static str {
        "discovery.enumerated"
    }
}
