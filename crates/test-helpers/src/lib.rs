//! Test helpers for netsim.
//!
//! Provides a propagator that records what it was asked to fan out, small
//! builders for the maps the phase operations take, and sample circuit
//! descriptions shared by the cluster tests.
//!
//! # Example
//!
//! ```rust
//! use netsim_core::NetPropagator;
//! use netsim_test_helpers::{nets, RecordingPropagator};
//! use netsim_types::{Moment, NetId, ScheduledValue, Signal};
//!
//! let mut propagator = RecordingPropagator::default();
//! propagator
//!     .propagate(&NetId::new("C"), ScheduledValue::new(Signal::One, Moment(0)))
//!     .unwrap();
//! assert_eq!(propagator.values_for("C"), vec![Signal::One]);
//! assert_eq!(nets(&["C"]).len(), 1);
//! ```

pub mod circuits;

use netsim_core::{NetPropagator, PropagationError};
use netsim_types::{NetId, ScheduledValue, Signal};
use std::collections::{BTreeMap, BTreeSet};

/// Propagator that records every announcement.
#[derive(Debug, Default, Clone)]
pub struct RecordingPropagator {
    pub published: Vec<(NetId, ScheduledValue)>,
}

impl RecordingPropagator {
    /// Signals announced for `net`, in order.
    pub fn values_for(&self, net: &str) -> Vec<Signal> {
        self.published
            .iter()
            .filter(|(n, _)| n.as_str() == net)
            .map(|(_, v)| v.signal)
            .collect()
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl NetPropagator for RecordingPropagator {
    fn propagate(&mut self, net: &NetId, value: ScheduledValue) -> Result<(), PropagationError> {
        self.published.push((net.clone(), value));
        Ok(())
    }
}

/// Propagator that rejects everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingPropagator;

impl NetPropagator for FailingPropagator {
    fn propagate(&mut self, net: &NetId, _value: ScheduledValue) -> Result<(), PropagationError> {
        Err(PropagationError::Publish {
            net: net.clone(),
            reason: "test propagator refuses".to_string(),
        })
    }
}

/// Pin name → net bindings.
pub fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, NetId> {
    pairs
        .iter()
        .map(|(pin, net)| (pin.to_string(), NetId::new(*net)))
        .collect()
}

/// Net → level map.
pub fn levels(pairs: &[(&str, Signal)]) -> BTreeMap<NetId, Signal> {
    pairs.iter().map(|(net, s)| (NetId::new(*net), *s)).collect()
}

/// Set of net ids.
pub fn nets(ids: &[&str]) -> BTreeSet<NetId> {
    ids.iter().map(|id| NetId::new(*id)).collect()
}
