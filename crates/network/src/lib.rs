//! Message transport for netsim.
//!
//! Defines the [`Transport`] interface the coordinator and the fan-out
//! propagator send through, and [`MemoryBus`], an in-process implementation
//! that gives every node a private request channel, a broadcast channel and
//! a per-net publish/subscribe channel.

mod memory;
mod traits;

pub use memory::{BusStats, InboundRequest, MemoryBus, NodeEndpoint};
pub use traits::{BusError, Transport};
