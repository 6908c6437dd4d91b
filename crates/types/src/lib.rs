//! Core types for the netsim logic simulator.
//!
//! This crate provides the leaf types shared by every other crate:
//!
//! - **Signals**: the four-valued logic domain and its wired resolution rule
//! - **Identifiers**: Moment, NetId, UnitId, PinId, NodeName
//! - **Scheduling**: ScheduledValue, a signal paired with the moment it takes effect
//!
//! # Design Philosophy
//!
//! This crate does not depend on any other workspace crate, making it the
//! foundation layer. Everything here is serializable so that the same types
//! cross node boundaries unchanged.

mod identifiers;
mod scheduled;
mod signal;

pub use identifiers::{Moment, NetId, NodeName, PinId, UnitId};
pub use scheduled::ScheduledValue;
pub use signal::{resolve, ParseSignalError, Signal};
