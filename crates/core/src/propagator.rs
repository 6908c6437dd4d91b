//! Cross-node announcement capability.

use netsim_types::{NetId, ScheduledValue};
use thiserror::Error;

/// Failure to hand a net value to the fan-out layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropagationError {
    /// The transport refused or lost the value.
    #[error("Failed to publish {net}: {reason}")]
    Publish { net: NetId, reason: String },
}

/// Sink a driver announces locally driven net values to.
///
/// Implemented by the messaging layer, which fans the value out to every
/// node listening to the net. Delivery is best-effort: the driver logs a
/// failure and moves on.
pub trait NetPropagator {
    fn propagate(&mut self, net: &NetId, value: ScheduledValue) -> Result<(), PropagationError>;
}

/// Any closure taking a net and value can stand in as a propagator.
impl<F> NetPropagator for F
where
    F: FnMut(&NetId, ScheduledValue) -> Result<(), PropagationError>,
{
    fn propagate(&mut self, net: &NetId, value: ScheduledValue) -> Result<(), PropagationError> {
        self(net, value)
    }
}
