//! Coordinator errors.

use crate::CircuitError;
use netsim_core::{ErrorKind, NetlistError};
use netsim_messages::CodecError;
use netsim_network::BusError;
use netsim_types::{Moment, NodeName, UnitId};
use thiserror::Error;

/// Errors raised while driving a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// No reply within the phase timeout on any attempt.
    #[error("{node} did not answer {phase} (moment {moment:?}) after {attempts} attempts")]
    NodeUnresponsive {
        node: NodeName,
        phase: &'static str,
        moment: Option<Moment>,
        attempts: u32,
    },

    /// The node replied with an explicit error.
    #[error("{node} rejected {phase}: {message}")]
    NodeError {
        node: NodeName,
        phase: &'static str,
        kind: ErrorKind,
        message: String,
    },

    /// The node replied with the wrong reply type.
    #[error("{node} sent an unexpected reply to {phase}")]
    UnexpectedReply { node: NodeName, phase: &'static str },

    /// A moment kept producing same-moment events.
    #[error("Moment {moment} did not settle within {rounds} delta rounds")]
    DeltaCycleLimit { moment: Moment, rounds: u32 },

    #[error("No nodes discovered")]
    NoNodes,

    #[error("{0} was not discovered")]
    UnknownNode(NodeName),

    #[error("Unit {0} is already placed")]
    DuplicateUnit(UnitId),

    /// Rejected before anything was sent.
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}
