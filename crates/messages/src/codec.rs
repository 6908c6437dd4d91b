//! Message encoding and decoding for transport.
//!
//! # Wire Format
//!
//! Every message is a JSON document. Enums carry their variant in a `"type"`
//! field:
//!
//! ```text
//! {"type":"PropagateInputs","moment":3,"net_drivers":{"A":"1"}}
//! ```
//!
//! The channel a payload arrives on determines which message type it is
//! decoded as.

use crate::NetworkMessage;
use thiserror::Error;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Empty message")]
    Empty,

    #[error("Failed to decode {message_type}: {reason}")]
    Decode {
        message_type: &'static str,
        reason: String,
    },

    #[error("Failed to encode {message_type}: {reason}")]
    Encode {
        message_type: &'static str,
        reason: String,
    },
}

/// Encode a message to wire format.
pub fn encode<M: NetworkMessage>(message: &M) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(|e| CodecError::Encode {
        message_type: M::message_type_id(),
        reason: e.to_string(),
    })
}

/// Decode a message of type `M` from wire format.
pub fn decode<M: NetworkMessage>(data: &[u8]) -> Result<M, CodecError> {
    if data.is_empty() {
        return Err(CodecError::Empty);
    }
    serde_json::from_slice(data).map_err(|e| CodecError::Decode {
        message_type: M::message_type_id(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BroadcastMessage, ErrorReply, InstallModel, NodeReply, NodeRequest, PropagateInputs,
        ScheduleNetValue,
    };
    use netsim_core::ErrorKind;
    use netsim_types::{Moment, NetId, NodeName, ScheduledValue, Signal, UnitId};
    use std::collections::BTreeMap;

    #[test]
    fn test_request_wire_shape() {
        let request: NodeRequest = PropagateInputs::new(
            Moment(3),
            BTreeMap::from([(NetId::new("A"), Signal::One)]),
        )
        .into();
        let bytes = encode(&request).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "PropagateInputs", "moment": 3, "net_drivers": {"A": "1"}})
        );
        assert_eq!(decode::<NodeRequest>(&bytes).unwrap(), request);
    }

    #[test]
    fn test_decode_hand_written_install() {
        let data = br#"{"type":"InstallModel","type_selector":"and2","unit_id":"g1","name":"gate","pin_to_net":{"a":"A","q":"C"}}"#;
        let request = decode::<NodeRequest>(data).unwrap();
        let NodeRequest::InstallModel(install) = request else {
            panic!("expected an install request");
        };
        assert_eq!(install.unit_id, UnitId::new("g1"));
        assert_eq!(install.pin_to_net.len(), 2);

        // Bindings may be left out entirely
        let data = br#"{"type":"InstallModel","type_selector":"not","unit_id":"g2","name":"inv"}"#;
        let request = decode::<NodeRequest>(data).unwrap();
        assert_eq!(
            request,
            NodeRequest::from(InstallModel::new(
                "not",
                UnitId::new("g2"),
                "inv",
                BTreeMap::new()
            ))
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(decode::<NodeRequest>(b""), Err(CodecError::Empty));
        assert!(matches!(
            decode::<NodeRequest>(br#"{"type":"Teleport"}"#),
            Err(CodecError::Decode { message_type: "node.request", .. })
        ));
        assert!(decode::<NodeRequest>(b"not json").is_err());
        assert!(decode::<BroadcastMessage>(br#"{"type":"Explode"}"#).is_err());
    }

    #[test]
    fn test_broadcast_and_fanout_shapes() {
        let bytes = encode(&BroadcastMessage::Reset).unwrap();
        assert_eq!(bytes, br#"{"type":"Reset"}"#);

        let fanout = ScheduleNetValue::new(
            NetId::new("C"),
            NodeName::new("node-0"),
            ScheduledValue::new(Signal::Floating, Moment(9)),
        );
        let json: serde_json::Value = serde_json::from_slice(&encode(&fanout).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"net": "C", "source": "node-0", "value": {"signal": "Z", "moment": 9}})
        );
    }

    #[test]
    fn test_error_reply_shape() {
        let reply = NodeReply::Error(ErrorReply::malformed("bad"));
        let json: serde_json::Value = serde_json::from_slice(&encode(&reply).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Error", "kind": "Malformed", "message": "bad"})
        );
        let decoded = decode::<NodeReply>(&encode(&reply).unwrap()).unwrap();
        assert!(matches!(
            decoded,
            NodeReply::Error(ErrorReply { kind: ErrorKind::Malformed, .. })
        ));
    }
}
