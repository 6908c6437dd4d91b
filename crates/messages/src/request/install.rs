//! Topology request.

use crate::response::SimpleAck;
use crate::{NodeRequest, Request};
use netsim_types::{NetId, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instantiate a model from the catalog and bind its pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallModel {
    /// Catalog selector, e.g. `and2`.
    pub type_selector: String,
    pub unit_id: UnitId,
    pub name: String,
    /// Pin name → net. Pins left out stay unbound.
    #[serde(default)]
    pub pin_to_net: BTreeMap<String, NetId>,
}

impl InstallModel {
    pub fn new(
        type_selector: impl Into<String>,
        unit_id: UnitId,
        name: impl Into<String>,
        pin_to_net: BTreeMap<String, NetId>,
    ) -> Self {
        Self {
            type_selector: type_selector.into(),
            unit_id,
            name: name.into(),
            pin_to_net,
        }
    }
}

impl Request for InstallModel {
    type Response = SimpleAck;
}

impl From<InstallModel> for NodeRequest {
    fn from(r: InstallModel) -> Self {
        NodeRequest::InstallModel(r)
    }
}
