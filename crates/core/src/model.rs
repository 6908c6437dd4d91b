//! The capability every simulated device implements.

use crate::Direction;
use indexmap::IndexMap;
use netsim_types::Signal;
use std::fmt::Debug;

/// Pin name to level, in declaration order.
pub type Levels = IndexMap<String, Signal>;

/// Declaration of a pin a model exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSpec {
    pub name: String,
    pub direction: Direction,
}

impl PinSpec {
    /// Declare an input pin.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Input,
        }
    }

    /// Declare an output pin.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Output,
        }
    }
}

/// A logic element that maps input levels to output levels.
///
/// Models are driven by a [`Device`](crate::Device), which owns the pins and
/// decides which outputs actually changed. A model is:
///
/// - **Synchronous**: evaluation never blocks or awaits
/// - **Deterministic**: same state and inputs give the same outputs
/// - **Local**: it sees only its own input levels, never nets or nodes
///
/// # Example
///
/// ```ignore
/// impl Model for Inverter {
///     fn kind(&self) -> &str { "not" }
///
///     fn pins(&self) -> Vec<PinSpec> {
///         vec![PinSpec::input("a"), PinSpec::output("y")]
///     }
///
///     fn evaluate(&mut self, inputs: &Levels) -> Levels {
///         let a = inputs.get("a").copied().unwrap_or(Signal::Floating);
///         Levels::from([("y".to_string(), a.not())])
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Model: Send + Debug {
    /// The type selector this model was registered under.
    fn kind(&self) -> &str;

    /// Pins this model exposes. Names must be unique.
    fn pins(&self) -> Vec<PinSpec>;

    /// Compute output levels from the current input levels.
    ///
    /// `inputs` contains every declared input pin. Outputs missing from the
    /// returned map keep their previous value. Stateful models update their
    /// internal state here.
    fn evaluate(&mut self, inputs: &Levels) -> Levels;

    /// Return to the power-on state.
    fn reset(&mut self);

    /// Ticks between an input change and the resulting output change.
    ///
    /// Zero means the output takes effect within the same moment, one delta
    /// round later.
    fn delay(&self) -> u64 {
        0
    }
}

/// Read an input level, treating a missing pin as floating.
pub fn level(inputs: &Levels, pin: &str) -> Signal {
    inputs.get(pin).copied().unwrap_or(Signal::Floating)
}
