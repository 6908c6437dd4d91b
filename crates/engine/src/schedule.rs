//! Moment-ordered queue of driver values waiting to take effect.

use netsim_core::DriverId;
use netsim_types::{Moment, NetId, ScheduledValue, Signal};
use std::collections::{BTreeMap, BTreeSet};

/// Ordering key for pending values.
///
/// Values are ordered by effective moment, then by insertion order so that a
/// later value for the same driver overrides an earlier one when drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    moment: Moment,
    sequence: u64,
}

/// A driver value not yet applied to its net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingValue {
    pub net: NetId,
    pub driver: DriverId,
    pub signal: Signal,
    pub moment: Moment,
}

impl PendingValue {
    pub fn scheduled(&self) -> ScheduledValue {
        ScheduledValue::new(self.signal, self.moment)
    }
}

/// Pending driver values ordered by effective moment.
#[derive(Debug, Default)]
pub struct Schedule {
    entries: BTreeMap<Key, PendingValue>,
    next_sequence: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `signal` from `driver` onto `net`, effective at `moment`.
    pub fn push(&mut self, net: NetId, driver: DriverId, signal: Signal, moment: Moment) {
        let key = Key {
            moment,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.insert(
            key,
            PendingValue {
                net,
                driver,
                signal,
                moment,
            },
        );
    }

    /// Remove and return every value due at or before `now`, oldest first,
    /// that satisfies `filter`.
    pub fn drain_due<F>(&mut self, now: Moment, mut filter: F) -> Vec<PendingValue>
    where
        F: FnMut(&PendingValue) -> bool,
    {
        let keys: Vec<Key> = self
            .entries
            .range(..=Key {
                moment: now,
                sequence: u64::MAX,
            })
            .filter(|(_, v)| filter(v))
            .map(|(k, _)| *k)
            .collect();
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k))
            .collect()
    }

    /// Nets with at least one value due at or before `now`.
    pub fn due_nets(&self, now: Moment) -> BTreeSet<NetId> {
        self.entries
            .values()
            .take_while(|v| v.moment <= now)
            .map(|v| v.net.clone())
            .collect()
    }

    /// Earliest pending moment.
    pub fn next_moment(&self) -> Option<Moment> {
        self.entries.keys().next().map(|k| k.moment)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(n: &str) -> NetId {
        NetId::new(n)
    }

    #[test]
    fn test_drain_due_in_moment_order() {
        let mut s = Schedule::new();
        s.push(net("b"), DriverId::Coordinator, Signal::One, Moment(5));
        s.push(net("a"), DriverId::Coordinator, Signal::Zero, Moment(2));
        s.push(net("c"), DriverId::Coordinator, Signal::One, Moment(9));

        assert_eq!(s.next_moment(), Some(Moment(2)));
        assert_eq!(s.due_nets(Moment(5)), BTreeSet::from([net("a"), net("b")]));

        let drained = s.drain_due(Moment(5), |_| true);
        let nets: Vec<_> = drained.iter().map(|v| v.net.as_str()).collect();
        assert_eq!(nets, vec!["a", "b"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_moment(), Some(Moment(9)));
    }

    #[test]
    fn test_same_moment_keeps_insertion_order() {
        let mut s = Schedule::new();
        s.push(net("a"), DriverId::Coordinator, Signal::Zero, Moment(1));
        s.push(net("a"), DriverId::Coordinator, Signal::One, Moment(1));
        let drained = s.drain_due(Moment(1), |_| true);
        assert_eq!(drained[0].signal, Signal::Zero);
        assert_eq!(drained[1].signal, Signal::One);
        assert!(s.is_empty());
    }

    #[test]
    fn test_filter_leaves_other_values_queued() {
        let mut s = Schedule::new();
        s.push(net("a"), DriverId::Coordinator, Signal::One, Moment(0));
        s.push(net("b"), DriverId::Coordinator, Signal::One, Moment(0));
        let drained = s.drain_due(Moment(0), |v| v.net == net("b"));
        assert_eq!(drained.len(), 1);
        assert_eq!(s.due_nets(Moment(0)), BTreeSet::from([net("a")]));
    }
}
