//! Replies a node sends back for a [`NodeRequest`](crate::NodeRequest).

use crate::{FromReply, NetworkMessage};
use netsim_core::{ErrorKind, NetlistError};
use netsim_types::{Moment, NetId, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Success with no payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAck {}

/// Nets that received newly scheduled values, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEventQueue {
    #[serde(default)]
    pub events: BTreeMap<NetId, BTreeSet<Moment>>,
}

impl UpdateEventQueue {
    pub fn new(events: BTreeMap<NetId, BTreeSet<Moment>>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Local resolved value of each requested net this node drives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagatedNetDrivers {
    #[serde(default)]
    pub drivers: BTreeMap<NetId, Signal>,
}

impl PropagatedNetDrivers {
    pub fn new(drivers: BTreeMap<NetId, Signal>) -> Self {
        Self { drivers }
    }
}

/// A request failed; nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReply {
    /// An error for a payload that could not be decoded.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Malformed,
            message: reason.into(),
        }
    }
}

impl From<&NetlistError> for ErrorReply {
    fn from(e: &NetlistError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Any reply to a node request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeReply {
    SimpleAck(SimpleAck),
    UpdateEventQueue(UpdateEventQueue),
    PropagatedNetDrivers(PropagatedNetDrivers),
    Error(ErrorReply),
}

impl NodeReply {
    pub fn is_error(&self) -> bool {
        matches!(self, NodeReply::Error(_))
    }
}

impl From<&NetlistError> for NodeReply {
    fn from(e: &NetlistError) -> Self {
        NodeReply::Error(ErrorReply::from(e))
    }
}

impl NetworkMessage for NodeReply {
    fn message_type_id() -> &'static str {
        "node.reply"
    }
}

impl FromReply for SimpleAck {
    fn from_reply(reply: NodeReply) -> Result<Self, NodeReply> {
        match reply {
            NodeReply::SimpleAck(ack) => Ok(ack),
            other => Err(other),
        }
    }
}

impl FromReply for UpdateEventQueue {
    fn from_reply(reply: NodeReply) -> Result<Self, NodeReply> {
        match reply {
            NodeReply::UpdateEventQueue(queue) => Ok(queue),
            other => Err(other),
        }
    }
}

impl FromReply for PropagatedNetDrivers {
    fn from_reply(reply: NodeReply) -> Result<Self, NodeReply> {
        match reply {
            NodeReply::PropagatedNetDrivers(drivers) => Ok(drivers),
            other => Err(other),
        }
    }
}
