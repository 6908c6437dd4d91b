//! Requests the coordinator sends to a single node.
//!
//! Every request receives exactly one [`NodeReply`](crate::NodeReply).

mod install;
mod phase;

pub use install::InstallModel;
pub use phase::{InitialiseModels, PropagateInputs, PropagateOutputs, UpdateModels};

use crate::NetworkMessage;
use netsim_types::Moment;
use serde::{Deserialize, Serialize};

/// A request addressed to one node's private channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeRequest {
    InitialiseModels(InitialiseModels),
    PropagateInputs(PropagateInputs),
    PropagateOutputs(PropagateOutputs),
    UpdateModels(UpdateModels),
    InstallModel(InstallModel),
}

impl NodeRequest {
    /// Short name of the request, for logs and errors.
    pub fn phase(&self) -> &'static str {
        match self {
            NodeRequest::InitialiseModels(_) => "initialise_models",
            NodeRequest::PropagateInputs(_) => "propagate_inputs",
            NodeRequest::PropagateOutputs(_) => "propagate_outputs",
            NodeRequest::UpdateModels(_) => "update_models",
            NodeRequest::InstallModel(_) => "install_model",
        }
    }

    /// The moment a phase request applies to, if any.
    pub fn moment(&self) -> Option<Moment> {
        match self {
            NodeRequest::PropagateInputs(r) => Some(r.moment),
            NodeRequest::PropagateOutputs(r) => Some(r.moment),
            NodeRequest::UpdateModels(r) => Some(r.moment),
            NodeRequest::InitialiseModels(_) | NodeRequest::InstallModel(_) => None,
        }
    }
}

impl NetworkMessage for NodeRequest {
    fn message_type_id() -> &'static str {
        "node.request"
    }
}
