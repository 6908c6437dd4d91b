//! Per-node simulation engine.
//!
//! [`NetlistDriver`] owns a node's partition of devices and nets and runs the
//! four simulation phases over it. It performs no I/O: cross-node values
//! leave through a [`netsim_core::NetPropagator`] and arrive through
//! [`NetlistDriver::schedule_remote`].

mod driver;
mod schedule;

pub use driver::{EventReport, NetlistDriver};
pub use schedule::{PendingValue, Schedule};
