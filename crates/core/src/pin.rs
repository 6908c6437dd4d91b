//! Model terminals.

use netsim_types::{NetId, Signal};
use serde::{Deserialize, Serialize};

/// Whether a pin accepts values from its net or drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Listens to a net; its value is pushed in by net resolution.
    Input,
    /// Drives a net with the value its model last produced.
    Output,
}

/// A named terminal on a model.
///
/// An input pin carries the resolved value of the net it listens to. An
/// output pin carries the value its model last produced; it starts
/// `Floating` because nothing has been driven before initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    name: String,
    direction: Direction,
    value: Signal,
    net: Option<NetId>,
}

impl Pin {
    /// Create an unconnected pin.
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            value: Signal::Floating,
            net: None,
        }
    }

    /// The pin's local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input or output.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True for input pins.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    /// Current value.
    pub fn value(&self) -> Signal {
        self.value
    }

    /// Replace the current value, returning true if it changed.
    pub fn set_value(&mut self, value: Signal) -> bool {
        let changed = self.value != value;
        self.value = value;
        changed
    }

    /// The net this pin is bound to, if any.
    pub fn net(&self) -> Option<&NetId> {
        self.net.as_ref()
    }

    /// Bind this pin to a net.
    pub(crate) fn connect(&mut self, net: NetId) {
        self.net = Some(net);
    }

    /// Return to the unconnected-at-startup value, keeping the binding.
    pub(crate) fn reset(&mut self) {
        self.value = Signal::Floating;
    }
}
