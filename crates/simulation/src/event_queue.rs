//! Pending net events reported by nodes.

use netsim_types::{Moment, NetId, NodeName};
use std::collections::{BTreeMap, BTreeSet};

/// Nets with scheduled values, keyed by moment and then by the node whose
/// drivers produced them.
///
/// Ordered by moment first and node name second, so draining is
/// deterministic regardless of reply arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    pending: BTreeMap<Moment, BTreeMap<NodeName, BTreeSet<NetId>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node's `net → moments` report.
    pub fn merge(&mut self, node: &NodeName, report: &BTreeMap<NetId, BTreeSet<Moment>>) {
        for (net, moments) in report {
            for moment in moments {
                self.pending
                    .entry(*moment)
                    .or_default()
                    .entry(node.clone())
                    .or_default()
                    .insert(net.clone());
            }
        }
    }

    pub fn next_moment(&self) -> Option<Moment> {
        self.pending.keys().next().copied()
    }

    pub fn has_events_at(&self, moment: Moment) -> bool {
        self.pending.contains_key(&moment)
    }

    /// Remove every event at or before `moment`, grouped by node.
    pub fn take_due(&mut self, moment: Moment) -> BTreeMap<NodeName, BTreeSet<NetId>> {
        let later = self.pending.split_off(&Moment(moment.0.saturating_add(1)));
        let due = std::mem::replace(&mut self.pending, later);
        let mut by_node: BTreeMap<NodeName, BTreeSet<NetId>> = BTreeMap::new();
        for nodes in due.into_values() {
            for (node, nets) in nodes {
                by_node.entry(node).or_default().extend(nets);
            }
        }
        by_node
    }

    /// Number of (moment, node, net) entries.
    pub fn len(&self) -> usize {
        self.pending
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(entries: &[(&str, &[u64])]) -> BTreeMap<NetId, BTreeSet<Moment>> {
        entries
            .iter()
            .map(|(net, moments)| {
                (
                    NetId::new(*net),
                    moments.iter().map(|m| Moment(*m)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_take_due_drains_up_to_moment() {
        let mut queue = EventQueue::new();
        let n0 = NodeName::new("n0");
        let n1 = NodeName::new("n1");
        queue.merge(&n0, &report(&[("C", &[0, 4]), ("D", &[2])]));
        queue.merge(&n1, &report(&[("C", &[2])]));
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.next_moment(), Some(Moment(0)));

        let due = queue.take_due(Moment(2));
        assert_eq!(due[&n0].len(), 2);
        assert_eq!(due[&n1], BTreeSet::from([NetId::new("C")]));
        assert!(!queue.has_events_at(Moment(2)));
        assert_eq!(queue.next_moment(), Some(Moment(4)));

        queue.clear();
        assert!(queue.is_empty());
    }
}
