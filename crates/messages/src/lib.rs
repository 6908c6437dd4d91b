//! Network messages for the netsim control plane.
//!
//! Three kinds of traffic flow between the coordinator and nodes:
//!
//! - [`NodeRequest`] / [`NodeReply`]: phase and topology requests addressed
//!   to one node, each answered exactly once
//! - [`BroadcastMessage`] / [`Enumerated`]: control broadcasts to every node
//!   and the discovery announcements they trigger
//! - [`ScheduleNetValue`]: net value fan-out between nodes, keyed by net

pub mod broadcast;
pub mod codec;
pub mod discovery;
pub mod netlist;
pub mod request;
pub mod response;
mod traits;

// Re-export commonly used types
pub use broadcast::BroadcastMessage;
pub use codec::{decode, encode, CodecError};
pub use discovery::Enumerated;
pub use netlist::ScheduleNetValue;
pub use request::{
    InitialiseModels, InstallModel, NodeRequest, PropagateInputs, PropagateOutputs, UpdateModels,
};
pub use response::{
    ErrorReply, NodeReply, PropagatedNetDrivers, SimpleAck, UpdateEventQueue,
};
pub use traits::{FromReply, NetworkMessage, Request};
