//! Models assembled from other models.
//!
//! A composite wires child models together through named internal wires. The
//! composite's own pins are wires too: an input pin's level is written to
//! the wire of the same name before the children run, and an output pin
//! reads the wire of the same name afterwards.
//!
//! Children are evaluated in order, repeatedly, until no wire changes. A
//! composite that has not settled after [`MAX_SETTLE_ITERATIONS`] passes
//! drives every output unknown.

use indexmap::IndexMap;
use netsim_core::{Direction, Levels, Model, PinSpec};
use netsim_types::Signal;
use tracing::warn;

/// Upper bound on evaluation passes before a composite is declared unstable.
pub const MAX_SETTLE_ITERATIONS: usize = 32;

#[derive(Debug)]
struct Child {
    model: Box<dyn Model>,
    /// Child pin name → wire name.
    wiring: IndexMap<String, String>,
}

/// A model built from child models.
#[derive(Debug)]
pub struct Composite {
    kind: &'static str,
    pins: Vec<PinSpec>,
    children: Vec<Child>,
    wires: IndexMap<String, Signal>,
}

impl Composite {
    /// Start building a composite registered under `kind`.
    pub fn builder(kind: &'static str) -> CompositeBuilder {
        CompositeBuilder {
            kind,
            pins: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Run children until the wires stop changing. Returns false if they never did.
    fn settle(&mut self) -> bool {
        for _ in 0..MAX_SETTLE_ITERATIONS {
            let mut changed = false;
            for child in &mut self.children {
                let inputs: Levels = child
                    .model
                    .pins()
                    .iter()
                    .filter(|spec| spec.direction == Direction::Input)
                    .map(|spec| {
                        let level = child
                            .wiring
                            .get(&spec.name)
                            .and_then(|wire| self.wires.get(wire))
                            .copied()
                            .unwrap_or(Signal::Floating);
                        (spec.name.clone(), level)
                    })
                    .collect();

                for (pin, level) in child.model.evaluate(&inputs) {
                    let Some(wire) = child.wiring.get(&pin) else {
                        continue;
                    };
                    let slot = self.wires.entry(wire.clone()).or_insert(Signal::Floating);
                    if *slot != level {
                        *slot = level;
                        changed = true;
                    }
                }
            }
            if !changed {
                return true;
            }
        }
        false
    }
}

impl Model for Composite {
    fn kind(&self) -> &str {
        self.kind
    }

    fn pins(&self) -> Vec<PinSpec> {
        self.pins.clone()
    }

    fn evaluate(&mut self, inputs: &Levels) -> Levels {
        for spec in self.pins.iter().filter(|s| s.direction == Direction::Input) {
            let level = inputs.get(&spec.name).copied().unwrap_or(Signal::Floating);
            self.wires.insert(spec.name.clone(), level);
        }

        let settled = self.settle();
        if !settled {
            warn!(kind = self.kind, "Composite did not settle, driving unknown");
        }

        self.pins
            .iter()
            .filter(|s| s.direction == Direction::Output)
            .map(|spec| {
                let level = if settled {
                    self.wires
                        .get(&spec.name)
                        .copied()
                        .unwrap_or(Signal::Floating)
                } else {
                    Signal::Unknown
                };
                (spec.name.clone(), level)
            })
            .collect()
    }

    fn reset(&mut self) {
        for child in &mut self.children {
            child.model.reset();
        }
        self.wires.clear();
    }
}

/// Builder for [`Composite`].
#[derive(Debug)]
pub struct CompositeBuilder {
    kind: &'static str,
    pins: Vec<PinSpec>,
    children: Vec<Child>,
}

impl CompositeBuilder {
    /// Expose an input pin, backed by the wire of the same name.
    pub fn input(mut self, name: &str) -> Self {
        self.pins.push(PinSpec::input(name));
        self
    }

    /// Expose an output pin, backed by the wire of the same name.
    pub fn output(mut self, name: &str) -> Self {
        self.pins.push(PinSpec::output(name));
        self
    }

    /// Add a child, connecting each `(child pin, wire)` pair.
    pub fn child(mut self, model: impl Model + 'static, wiring: &[(&str, &str)]) -> Self {
        self.children.push(Child {
            model: Box::new(model),
            wiring: wiring
                .iter()
                .map(|(pin, wire)| (pin.to_string(), wire.to_string()))
                .collect(),
        });
        self
    }

    pub fn build(self) -> Composite {
        Composite {
            kind: self.kind,
            pins: self.pins,
            children: self.children,
            wires: IndexMap::new(),
        }
    }
}
