//! An installed model instance and its pins.

use crate::{Direction, Levels, Model, NetlistError, Pin};
use indexmap::IndexMap;
use netsim_types::{Moment, NetId, PinId, ScheduledValue, Signal, UnitId};
use tracing::trace;

/// An output change produced by evaluating a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    /// The output pin that changed.
    pub pin: PinId,
    /// The net the pin drives, if connected.
    pub net: Option<NetId>,
    /// The new level and when it takes effect.
    pub value: ScheduledValue,
}

/// A model installed on a node under a unit id.
///
/// The device owns the pins; the model only sees levels. Evaluation reports
/// an output only when it differs from what that pin last produced.
#[derive(Debug)]
pub struct Device {
    unit: UnitId,
    name: String,
    model: Box<dyn Model>,
    pins: IndexMap<String, Pin>,
}

impl Device {
    /// Wrap a model, creating one unconnected pin per declared pin.
    pub fn new(unit: UnitId, name: impl Into<String>, model: Box<dyn Model>) -> Self {
        let pins = model
            .pins()
            .into_iter()
            .map(|spec| (spec.name.clone(), Pin::new(spec.name, spec.direction)))
            .collect();
        Self {
            unit,
            name: name.into(),
            model,
            pins,
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type selector of the wrapped model.
    pub fn kind(&self) -> &str {
        self.model.kind()
    }

    /// Look up a pin by local name.
    pub fn pin(&self, name: &str) -> Result<&Pin, NetlistError> {
        self.pins.get(name).ok_or_else(|| NetlistError::UnknownPin {
            unit: self.unit.clone(),
            pin: name.to_string(),
        })
    }

    /// All pins in declaration order.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    /// The full identity of one of this device's pins.
    pub fn pin_id(&self, name: &str) -> PinId {
        PinId::new(self.unit.clone(), name)
    }

    /// Check that `pin` can be bound to `net` without changing anything.
    pub fn check_connect(&self, pin: &str, net: &NetId) -> Result<Direction, NetlistError> {
        let p = self.pin(pin)?;
        match p.net() {
            Some(existing) if existing == net => Err(NetlistError::DuplicateBinding {
                pin: self.pin_id(pin),
                net: net.clone(),
            }),
            Some(existing) => Err(NetlistError::PinAlreadyConnected {
                pin: self.pin_id(pin),
                net: existing.clone(),
            }),
            None => Ok(p.direction()),
        }
    }

    /// Bind a pin to a net. Each pin binds to exactly one net.
    pub fn connect(&mut self, pin: &str, net: NetId) -> Result<Direction, NetlistError> {
        let direction = self.check_connect(pin, &net)?;
        if let Some(p) = self.pins.get_mut(pin) {
            p.connect(net);
        }
        Ok(direction)
    }

    /// Push a resolved net level into an input pin. Returns true if it changed.
    pub fn set_input(&mut self, pin: &str, value: Signal) -> bool {
        match self.pins.get_mut(pin) {
            Some(p) if p.is_input() => p.set_value(value),
            _ => false,
        }
    }

    /// Current levels of every input pin.
    pub fn inputs(&self) -> Levels {
        self.pins
            .values()
            .filter(|p| p.is_input())
            .map(|p| (p.name().to_string(), p.value()))
            .collect()
    }

    /// Propagation delay of the wrapped model.
    pub fn delay(&self) -> u64 {
        self.model.delay()
    }

    /// Run the model against the current inputs.
    ///
    /// Returns the outputs whose level changed, scheduled `delay` ticks after
    /// `moment`. Unchanged outputs produce nothing.
    pub fn evaluate(&mut self, moment: Moment) -> Vec<OutputEvent> {
        let inputs = self.inputs();
        let outputs = self.model.evaluate(&inputs);
        let effective = moment.after(self.model.delay());

        let mut events = Vec::new();
        for (name, level) in outputs {
            let Some(pin) = self.pins.get_mut(&name) else {
                continue;
            };
            if pin.is_input() || !pin.set_value(level) {
                continue;
            }
            trace!(unit = %self.unit, pin = %name, %level, %effective, "Output changed");
            events.push(OutputEvent {
                pin: PinId::new(self.unit.clone(), name),
                net: pin.net().cloned(),
                value: ScheduledValue::new(level, effective),
            });
        }
        events
    }

    /// Return the model and every pin to the power-on state. Bindings stay.
    pub fn reset(&mut self) {
        self.model.reset();
        for pin in self.pins.values_mut() {
            pin.reset();
        }
    }

    /// `(pin name, direction, net)` for every connected pin.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, Direction, &NetId)> {
        self.pins
            .values()
            .filter_map(|p| p.net().map(|net| (p.name(), p.direction(), net)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{level, PinSpec};

    /// Inverter with a configurable delay.
    #[derive(Debug)]
    struct Inv(u64);

    impl Model for Inv {
        fn kind(&self) -> &str {
            "inv"
        }

        fn pins(&self) -> Vec<PinSpec> {
            vec![PinSpec::input("a"), PinSpec::output("y")]
        }

        fn evaluate(&mut self, inputs: &Levels) -> Levels {
            Levels::from([("y".to_string(), level(inputs, "a").not())])
        }

        fn reset(&mut self) {}

        fn delay(&self) -> u64 {
            self.0
        }
    }

    fn device(delay: u64) -> Device {
        Device::new(UnitId::new("u1"), "inv", Box::new(Inv(delay)))
    }

    #[test]
    fn test_only_changed_outputs_are_reported() {
        let mut d = device(0);
        // Floating input reads as unknown, output starts floating
        let events = d.evaluate(Moment::ZERO);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value.signal, Signal::Unknown);

        // Re-evaluating with no change reports nothing
        assert!(d.evaluate(Moment(1)).is_empty());

        assert!(d.set_input("a", Signal::One));
        let events = d.evaluate(Moment(2));
        assert_eq!(events[0].value, ScheduledValue::new(Signal::Zero, Moment(2)));
    }

    #[test]
    fn test_delay_offsets_effective_moment() {
        let mut d = device(3);
        d.connect("y", NetId::new("out")).unwrap();
        let events = d.evaluate(Moment(5));
        assert_eq!(events[0].value.moment, Moment(8));
        assert_eq!(events[0].net, Some(NetId::new("out")));
    }

    #[test]
    fn test_connect_rules() {
        let mut d = device(0);
        assert!(matches!(
            d.connect("nope", NetId::new("n")),
            Err(NetlistError::UnknownPin { .. })
        ));
        assert_eq!(d.connect("a", NetId::new("n")), Ok(Direction::Input));
        assert!(matches!(
            d.connect("a", NetId::new("n")),
            Err(NetlistError::DuplicateBinding { .. })
        ));
        assert!(matches!(
            d.connect("a", NetId::new("m")),
            Err(NetlistError::PinAlreadyConnected { .. })
        ));
        assert_eq!(d.bindings().count(), 1);
    }

    #[test]
    fn test_set_input_ignores_outputs() {
        let mut d = device(0);
        assert!(!d.set_input("y", Signal::One));
        assert_eq!(d.pin("y").unwrap().value(), Signal::Floating);
    }

    #[test]
    fn test_reset_restores_pins_and_keeps_bindings() {
        let mut d = device(0);
        d.connect("a", NetId::new("n")).unwrap();
        d.set_input("a", Signal::One);
        d.evaluate(Moment::ZERO);
        d.reset();
        assert_eq!(d.pin("a").unwrap().value(), Signal::Floating);
        assert_eq!(d.pin("y").unwrap().value(), Signal::Floating);
        assert_eq!(d.pin("a").unwrap().net(), Some(&NetId::new("n")));
    }
}
