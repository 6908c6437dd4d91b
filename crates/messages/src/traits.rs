//! Traits shared by every message type.

use crate::response::NodeReply;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A message that can be carried by the transport.
pub trait NetworkMessage: Serialize + DeserializeOwned {
    /// Stable identifier used in logs and codec errors.
    fn message_type_id() -> &'static str;
}

/// Type-safe request/reply pairing for phase requests.
pub trait Request: Into<crate::NodeRequest> + Clone {
    /// The reply a node sends on success.
    type Response: FromReply;
}

/// Extraction of a typed reply from a [`NodeReply`].
pub trait FromReply: Sized {
    /// Returns the original reply if it is not of this type.
    fn from_reply(reply: NodeReply) -> Result<Self, NodeReply>;
}
