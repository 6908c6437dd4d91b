//! Request dispatch: decode, run against the node, encode the reply.

use crate::Node;
use netsim_core::NetPropagator;
use netsim_messages::{
    decode, encode, ErrorReply, NodeReply, NodeRequest, PropagatedNetDrivers, SimpleAck,
    UpdateEventQueue,
};
use netsim_types::NodeName;
use tracing::{debug, trace, warn};

/// Answers requests on a node's private channel.
///
/// Every request gets exactly one reply. The most recent request and its
/// reply are remembered; receiving the same request again straight away
/// returns the remembered reply without touching the node, so a coordinator
/// retry after a lost reply cannot apply a phase twice.
#[derive(Debug, Default)]
pub struct NodeListener {
    last: Option<(NodeRequest, NodeReply)>,
}

impl NodeListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the remembered reply.
    ///
    /// Call after anything that changes the node outside the request path.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Handle an encoded request and produce the encoded reply.
    ///
    /// Undecodable payloads are answered with a `Malformed` error reply and
    /// leave the node untouched.
    pub fn handle_payload<P>(&mut self, node: &mut Node, propagator: &mut P, payload: &[u8]) -> Vec<u8>
    where
        P: NetPropagator + ?Sized,
    {
        let reply = match decode::<NodeRequest>(payload) {
            Ok(request) => self.handle(node, propagator, request),
            Err(e) => {
                warn!(node = %node.name(), error = %e, "Dropping malformed request");
                NodeReply::Error(ErrorReply::malformed(e.to_string()))
            }
        };
        encode_reply(node.name(), &reply)
    }

    /// Handle a decoded request.
    pub fn handle<P>(&mut self, node: &mut Node, propagator: &mut P, request: NodeRequest) -> NodeReply
    where
        P: NetPropagator + ?Sized,
    {
        if let Some((last, reply)) = &self.last {
            if *last == request {
                debug!(node = %node.name(), phase = request.phase(), "Repeated request, replaying reply");
                return reply.clone();
            }
        }

        let reply = dispatch(node, propagator, &request);
        if let NodeReply::Error(e) = &reply {
            warn!(
                node = %node.name(),
                phase = request.phase(),
                kind = ?e.kind,
                error = %e.message,
                "Request failed"
            );
        } else {
            trace!(node = %node.name(), phase = request.phase(), "Request handled");
        }
        self.last = Some((request, reply.clone()));
        reply
    }
}

/// Encode `reply`, answering with an error reply if it cannot be encoded.
fn encode_reply(node: &NodeName, reply: &NodeReply) -> Vec<u8> {
    let e = match encode(reply) {
        Ok(bytes) => return bytes,
        Err(e) => e,
    };
    warn!(node = %node, error = %e, "Failed to encode reply");
    match encode(&NodeReply::Error(ErrorReply::malformed(e.to_string()))) {
        Ok(bytes) => bytes,
        Err(e) => {
            // The requester sees an empty payload and reports it as malformed.
            warn!(node = %node, error = %e, "Failed to encode error reply, replying empty");
            Vec::new()
        }
    }
}

fn dispatch<P>(node: &mut Node, propagator: &mut P, request: &NodeRequest) -> NodeReply
where
    P: NetPropagator + ?Sized,
{
    let result = match request {
        NodeRequest::InitialiseModels(_) => Ok(NodeReply::UpdateEventQueue(
            UpdateEventQueue::new(node.initialise_models()),
        )),
        NodeRequest::PropagateInputs(r) => node
            .propagate_inputs(r.moment, &r.net_drivers)
            .map(|()| NodeReply::SimpleAck(SimpleAck {})),
        NodeRequest::PropagateOutputs(r) => node
            .propagate_outputs(r.moment, &r.net_ids, propagator)
            .map(|drivers| NodeReply::PropagatedNetDrivers(PropagatedNetDrivers::new(drivers))),
        NodeRequest::UpdateModels(r) => node
            .update_models(r.moment)
            .map(|events| NodeReply::UpdateEventQueue(UpdateEventQueue::new(events))),
        NodeRequest::InstallModel(r) => node
            .install_model(&r.type_selector, r.unit_id.clone(), &r.name, &r.pin_to_net)
            .map(|()| NodeReply::SimpleAck(SimpleAck {})),
    };
    result.unwrap_or_else(|e| NodeReply::from(&e))
}
