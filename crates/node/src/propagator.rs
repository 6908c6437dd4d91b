//! Fan-out of locally driven net values over a transport.

use netsim_core::{NetPropagator, PropagationError};
use netsim_messages::{encode, ScheduleNetValue};
use netsim_network::Transport;
use netsim_types::{NetId, NodeName, ScheduledValue};
use tracing::trace;

/// Publishes each announced net value to the net's subscribers, tagged with
/// this node as the source.
pub struct BusPropagator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    source: NodeName,
}

impl<'a, T: Transport + ?Sized> BusPropagator<'a, T> {
    pub fn new(transport: &'a T, source: NodeName) -> Self {
        Self { transport, source }
    }
}

impl<T: Transport + ?Sized> NetPropagator for BusPropagator<'_, T> {
    fn propagate(&mut self, net: &NetId, value: ScheduledValue) -> Result<(), PropagationError> {
        let message = ScheduleNetValue::new(net.clone(), self.source.clone(), value);
        let payload = encode(&message).map_err(|e| PropagationError::Publish {
            net: net.clone(),
            reason: e.to_string(),
        })?;
        let delivered = self.transport.publish_net(net, payload);
        trace!(net = %net, %value, delivered, "Fan-out published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_messages::decode;
    use netsim_network::MemoryBus;
    use netsim_types::{Moment, Signal};

    #[test]
    fn test_publishes_tagged_value_to_subscribers() {
        let bus = MemoryBus::new();
        let mut listener = bus.register_node(NodeName::new("n1")).unwrap();
        bus.subscribe_net(&NodeName::new("n1"), NetId::new("C"));

        let mut propagator = BusPropagator::new(&bus, NodeName::new("n0"));
        let value = ScheduledValue::new(Signal::Zero, Moment(4));
        propagator.propagate(&NetId::new("C"), value).unwrap();
        propagator.propagate(&NetId::new("D"), value).unwrap();

        let fanout = decode::<ScheduleNetValue>(&listener.nets.try_recv().unwrap()).unwrap();
        assert_eq!(
            fanout,
            ScheduleNetValue::new(NetId::new("C"), NodeName::new("n0"), value)
        );
        assert!(listener.nets.try_recv().is_err());
        assert_eq!(bus.stats().net_publications, 2);
    }
}
