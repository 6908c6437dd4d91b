//! Simulation phase requests.

use crate::response::{PropagatedNetDrivers, SimpleAck, UpdateEventQueue};
use crate::{NodeRequest, Request};
use netsim_types::{Moment, NetId, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Evaluate every installed model once before the first moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialiseModels {}

impl InitialiseModels {
    pub fn new() -> Self {
        Self {}
    }
}

impl Request for InitialiseModels {
    type Response = UpdateEventQueue;
}

impl From<InitialiseModels> for NodeRequest {
    fn from(r: InitialiseModels) -> Self {
        NodeRequest::InitialiseModels(r)
    }
}

/// Apply coordinator-supplied net values for a moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagateInputs {
    pub moment: Moment,
    /// Values the coordinator drives onto nets. May be empty: the request
    /// still applies any fan-out values that have become due.
    #[serde(default)]
    pub net_drivers: BTreeMap<NetId, Signal>,
}

impl PropagateInputs {
    pub fn new(moment: Moment, net_drivers: BTreeMap<NetId, Signal>) -> Self {
        Self {
            moment,
            net_drivers,
        }
    }
}

impl Request for PropagateInputs {
    type Response = SimpleAck;
}

impl From<PropagateInputs> for NodeRequest {
    fn from(r: PropagateInputs) -> Self {
        NodeRequest::PropagateInputs(r)
    }
}

/// Apply due local outputs on the given nets and fan them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagateOutputs {
    pub moment: Moment,
    pub net_ids: BTreeSet<NetId>,
}

impl PropagateOutputs {
    pub fn new(moment: Moment, net_ids: BTreeSet<NetId>) -> Self {
        Self { moment, net_ids }
    }
}

impl Request for PropagateOutputs {
    type Response = PropagatedNetDrivers;
}

impl From<PropagateOutputs> for NodeRequest {
    fn from(r: PropagateOutputs) -> Self {
        NodeRequest::PropagateOutputs(r)
    }
}

/// Evaluate models whose inputs changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateModels {
    pub moment: Moment,
}

impl UpdateModels {
    pub fn new(moment: Moment) -> Self {
        Self { moment }
    }
}

impl Request for UpdateModels {
    type Response = UpdateEventQueue;
}

impl From<UpdateModels> for NodeRequest {
    fn from(r: UpdateModels) -> Self {
        NodeRequest::UpdateModels(r)
    }
}
