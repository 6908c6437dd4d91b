//! Error types for netlist operations.

use netsim_types::{Moment, NetId, PinId, UnitId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local validation failures raised by topology and phase operations.
///
/// Every failing operation leaves the partition exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    /// A net id is not part of this partition.
    #[error("Unknown net: {0}")]
    UnknownNet(NetId),

    /// A model has no pin with the given name.
    #[error("Unknown pin '{pin}' on unit {unit}")]
    UnknownPin { unit: UnitId, pin: String },

    /// No model with the given unit id is installed.
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// The type selector does not name a registered model.
    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    /// A model with this unit id is already installed.
    #[error("Duplicate unit id: {0}")]
    DuplicateUnitId(UnitId),

    /// The pin is already registered on this net.
    #[error("Pin {pin} is already bound to net {net}")]
    DuplicateBinding { pin: PinId, net: NetId },

    /// The pin is already connected to a different net.
    #[error("Pin {pin} is already connected to net {net}")]
    PinAlreadyConnected { pin: PinId, net: NetId },

    /// A type selector was registered twice.
    #[error("Duplicate model type: {0}")]
    DuplicateModelType(String),

    /// A factory produced a model that cannot be installed.
    #[error("Invalid model '{selector}': {reason}")]
    InvalidModel { selector: String, reason: String },

    /// A phase was requested for a moment earlier than one already applied.
    #[error("Moment {requested} is earlier than current moment {current}")]
    MomentRegression { requested: Moment, current: Moment },

    /// A phase was requested before inputs were propagated for its moment.
    #[error("{phase} for {moment} requested while driver is at {current:?}")]
    PhaseOutOfOrder {
        phase: &'static str,
        moment: Moment,
        current: Option<Moment>,
    },
}

/// Wire-stable classification of a [`NetlistError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownNet,
    UnknownPin,
    UnknownUnit,
    UnknownModelType,
    DuplicateUnitId,
    DuplicateBinding,
    PinAlreadyConnected,
    DuplicateModelType,
    InvalidModel,
    MomentRegression,
    PhaseOutOfOrder,
    /// The request could not be decoded.
    Malformed,
}

impl NetlistError {
    /// The wire classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetlistError::UnknownNet(_) => ErrorKind::UnknownNet,
            NetlistError::UnknownPin { .. } => ErrorKind::UnknownPin,
            NetlistError::UnknownUnit(_) => ErrorKind::UnknownUnit,
            NetlistError::UnknownModelType(_) => ErrorKind::UnknownModelType,
            NetlistError::DuplicateUnitId(_) => ErrorKind::DuplicateUnitId,
            NetlistError::DuplicateBinding { .. } => ErrorKind::DuplicateBinding,
            NetlistError::PinAlreadyConnected { .. } => ErrorKind::PinAlreadyConnected,
            NetlistError::DuplicateModelType(_) => ErrorKind::DuplicateModelType,
            NetlistError::InvalidModel { .. } => ErrorKind::InvalidModel,
            NetlistError::MomentRegression { .. } => ErrorKind::MomentRegression,
            NetlistError::PhaseOutOfOrder { .. } => ErrorKind::PhaseOutOfOrder,
        }
    }
}
