//! Wires and multi-driver resolution.

use crate::NetlistError;
use netsim_types::{resolve, NetId, NodeName, PinId, Signal};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Who is driving a value onto a net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DriverId {
    /// A local output pin.
    Pin(PinId),
    /// The contribution of all drivers on another node, received by fan-out.
    Remote(NodeName),
    /// A value injected by the coordinator.
    Coordinator,
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverId::Pin(pin) => write!(f, "pin {pin}"),
            DriverId::Remote(node) => write!(f, "remote {node}"),
            DriverId::Coordinator => f.write_str("coordinator"),
        }
    }
}

/// Outcome of re-resolving a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved value after the update.
    pub value: Signal,
    /// Whether the value differs from the previous resolution.
    pub changed: bool,
}

/// A named wire aggregating drivers and listeners.
///
/// Drivers may be local output pins or external slots (remote nodes, the
/// coordinator). Listeners are always local input pins. The net caches its
/// last resolved value; it only re-resolves when driver values are applied.
#[derive(Debug, Clone)]
pub struct Net {
    id: NetId,
    drivers: BTreeSet<PinId>,
    listeners: BTreeSet<PinId>,
    /// Latest value per driver. Absent drivers count as floating.
    driver_values: BTreeMap<DriverId, Signal>,
    value: Signal,
}

impl Net {
    /// Create a net with no drivers or listeners.
    pub fn new(id: NetId) -> Self {
        Self {
            id,
            drivers: BTreeSet::new(),
            listeners: BTreeSet::new(),
            driver_values: BTreeMap::new(),
            value: Signal::Floating,
        }
    }

    /// The net's id.
    pub fn id(&self) -> &NetId {
        &self.id
    }

    /// Register a local output pin as a driver.
    pub fn add_driver(&mut self, pin: PinId) -> Result<(), NetlistError> {
        if self.drivers.contains(&pin) {
            return Err(NetlistError::DuplicateBinding {
                pin,
                net: self.id.clone(),
            });
        }
        self.drivers.insert(pin);
        Ok(())
    }

    /// Register a local input pin as a listener.
    pub fn add_listener(&mut self, pin: PinId) -> Result<(), NetlistError> {
        if self.listeners.contains(&pin) {
            return Err(NetlistError::DuplicateBinding {
                pin,
                net: self.id.clone(),
            });
        }
        self.listeners.insert(pin);
        Ok(())
    }

    /// Unregister a driver pin and forget its value.
    ///
    /// The cached value is not re-resolved; call [`Net::apply_driver_values`]
    /// (possibly with no values) to refresh it.
    pub fn remove_driver(&mut self, pin: &PinId) -> bool {
        self.driver_values.remove(&DriverId::Pin(pin.clone()));
        self.drivers.remove(pin)
    }

    /// True if at least one local output pin drives this net.
    pub fn has_local_drivers(&self) -> bool {
        !self.drivers.is_empty()
    }

    /// Local driver pins.
    pub fn drivers(&self) -> impl Iterator<Item = &PinId> {
        self.drivers.iter()
    }

    /// Local listener pins.
    pub fn listeners(&self) -> impl Iterator<Item = &PinId> {
        self.listeners.iter()
    }

    /// True if at least one local input pin listens to this net.
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// The last resolved value. Does not re-resolve.
    pub fn current_value(&self) -> Signal {
        self.value
    }

    /// Resolution of local driver pins only: what this node contributes.
    pub fn local_value(&self) -> Signal {
        resolve(
            self.driver_values
                .iter()
                .filter(|(id, _)| matches!(id, DriverId::Pin(_)))
                .map(|(_, s)| *s),
        )
    }

    /// Latest value recorded for a driver.
    pub fn driver_value(&self, driver: &DriverId) -> Option<Signal> {
        self.driver_values.get(driver).copied()
    }

    /// Record new driver values and re-resolve.
    ///
    /// The caller is responsible for pushing the resolved value into the
    /// listening pins when [`Resolution::changed`] is set; the net does not
    /// own those pins.
    pub fn apply_driver_values<I>(&mut self, values: I) -> Resolution
    where
        I: IntoIterator<Item = (DriverId, Signal)>,
    {
        for (driver, signal) in values {
            self.driver_values.insert(driver, signal);
        }
        self.refresh()
    }

    /// Forget all driver values and return to floating.
    pub fn reset(&mut self) {
        self.driver_values.clear();
        self.value = Signal::Floating;
    }

    fn refresh(&mut self) -> Resolution {
        let value = resolve(self.driver_values.values().copied());
        let changed = value != self.value;
        self.value = value;
        Resolution { value, changed }
    }
}
