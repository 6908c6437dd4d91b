//! TOML circuit descriptions.
//!
//! ```toml
//! [[devices]]
//! type = "and2"          # catalog selector
//! unit = "g1"            # cluster-unique unit id
//! name = "gate"          # optional, defaults to the unit id
//! node = "node-0"        # optional placement
//! pins = { a = "A", b = "B", q = "C" }
//!
//! [[stimulus]]
//! at = 0
//! net = "A"
//! value = "1"            # 0, 1, X or Z
//! ```

use netsim_types::{Moment, NetId, NodeName, Signal, UnitId};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Errors loading a circuit description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid circuit description: {0}")]
    Parse(String),

    #[error("Unit {0} is declared twice")]
    DuplicateUnit(UnitId),

    #[error("Net {net} is stimulated twice at {at}")]
    DuplicateStimulus { net: NetId, at: Moment },
}

/// One device to install.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSpec {
    #[serde(rename = "type")]
    pub selector: String,
    pub unit: UnitId,
    #[serde(default)]
    pub name: Option<String>,
    /// Node to place the device on; any node if absent.
    #[serde(default)]
    pub node: Option<NodeName>,
    #[serde(default)]
    pub pins: BTreeMap<String, NetId>,
}

impl DeviceSpec {
    pub fn new(selector: impl Into<String>, unit: UnitId) -> Self {
        Self {
            selector: selector.into(),
            unit,
            name: None,
            node: None,
            pins: BTreeMap::new(),
        }
    }

    pub fn with_node(mut self, node: NodeName) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>, net: impl Into<String>) -> Self {
        self.pins.insert(pin.into(), NetId::new(net));
        self
    }

    /// Display name, falling back to the unit id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.unit.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct StimulusEntry {
    at: Moment,
    net: NetId,
    value: Signal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CircuitFile {
    #[serde(default)]
    devices: Vec<DeviceSpec>,
    #[serde(default)]
    stimulus: Vec<StimulusEntry>,
}

/// Values the coordinator drives onto nets, by moment.
///
/// A stimulated net keeps its value until the next stimulus for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stimulus {
    events: BTreeMap<Moment, BTreeMap<NetId, Signal>>,
}

impl Stimulus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `net` to `value` from `at` on. Replaces an earlier entry for the
    /// same net and moment.
    pub fn insert(&mut self, at: Moment, net: NetId, value: Signal) -> Option<Signal> {
        self.events.entry(at).or_default().insert(net, value)
    }

    /// Values applied at exactly `at`.
    pub fn at(&self, at: Moment) -> Option<&BTreeMap<NetId, Signal>> {
        self.events.get(&at)
    }

    /// First stimulus moment strictly after `after`, or the first one at all.
    pub fn next_after(&self, after: Option<Moment>) -> Option<Moment> {
        let mut moments = self.events.keys().copied();
        match after {
            Some(after) => moments.find(|m| *m > after),
            None => moments.next(),
        }
    }

    /// Every entry in moment order.
    pub fn iter(&self) -> impl Iterator<Item = (Moment, &NetId, Signal)> {
        self.events
            .iter()
            .flat_map(|(at, values)| values.iter().map(move |(net, v)| (*at, net, *v)))
    }

    /// Every stimulated net.
    pub fn nets(&self) -> BTreeSet<NetId> {
        self.events.values().flat_map(|v| v.keys().cloned()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of (moment, net) entries.
    pub fn len(&self) -> usize {
        self.events.values().map(BTreeMap::len).sum()
    }
}

/// A parsed circuit: devices in declaration order plus their stimulus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    pub devices: Vec<DeviceSpec>,
    pub stimulus: Stimulus,
}

impl Circuit {
    /// Parse a TOML circuit description.
    pub fn from_toml(text: &str) -> Result<Self, CircuitError> {
        let file: CircuitFile =
            toml::from_str(text).map_err(|e| CircuitError::Parse(e.to_string()))?;

        let mut units = BTreeSet::new();
        for device in &file.devices {
            if !units.insert(device.unit.clone()) {
                return Err(CircuitError::DuplicateUnit(device.unit.clone()));
            }
        }

        let mut stimulus = Stimulus::new();
        for entry in file.stimulus {
            if stimulus.insert(entry.at, entry.net.clone(), entry.value).is_some() {
                return Err(CircuitError::DuplicateStimulus {
                    net: entry.net,
                    at: entry.at,
                });
            }
        }

        Ok(Self {
            devices: file.devices,
            stimulus,
        })
    }

    /// Read and parse a circuit file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CircuitError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CircuitError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Nodes named by explicit placements.
    pub fn pinned_nodes(&self) -> BTreeSet<NodeName> {
        self.devices.iter().filter_map(|d| d.node.clone()).collect()
    }
}
