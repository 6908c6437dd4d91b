//! Cross-node net value fan-out.

use crate::NetworkMessage;
use netsim_types::{NetId, NodeName, ScheduledValue};
use serde::{Deserialize, Serialize};

/// The value one node drives onto a shared net, published to every node
/// subscribed to that net. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleNetValue {
    pub net: NetId,
    /// Node whose drivers produced the value.
    pub source: NodeName,
    pub value: ScheduledValue,
}

impl ScheduleNetValue {
    pub fn new(net: NetId, source: NodeName, value: ScheduledValue) -> Self {
        Self { net, source, value }
    }
}

impl NetworkMessage for ScheduleNetValue {
    fn message_type_id() -> &'static str {
        "net.schedule"
    }
}
