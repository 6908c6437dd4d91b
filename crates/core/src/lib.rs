//! Core netlist types for netsim.
//!
//! This crate defines the pieces a node's partition is built from:
//!
//! - [`Pin`]: a named input or output terminal on a model
//! - [`Net`]: a wire that resolves one signal from all of its drivers
//! - [`Model`]: the state-machine capability every device implements
//! - [`Device`]: an installed model instance with its pins
//! - [`ModelCatalog`]: type-selector to constructor registry
//! - [`NetPropagator`]: the sink a driver announces cross-node values to
//!
//! No I/O happens here. The engine crate drives these types through the
//! simulation phases; the node crate connects them to the messaging layer.

mod catalog;
mod device;
mod error;
mod model;
mod net;
mod pin;
mod propagator;

pub use catalog::{ModelCatalog, ModelFactory};
pub use device::{Device, OutputEvent};
pub use error::{ErrorKind, NetlistError};
pub use model::{level, Levels, Model, PinSpec};
pub use net::{DriverId, Net, Resolution};
pub use pin::{Direction, Pin};
pub use propagator::{NetPropagator, PropagationError};
