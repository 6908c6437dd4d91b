//! Recorded net values over time.

use netsim_types::{Moment, NetId, Signal};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// Resolved value of each observed net at every moment it changed.
///
/// Values recorded during delta rounds at one moment overwrite each other, so
/// a trace holds the settled value per moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Waveform {
    traces: BTreeMap<NetId, Vec<(Moment, Signal)>>,
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` on `net` at `moment`.
    ///
    /// Returns false if the net already had that value.
    pub fn record(&mut self, net: &NetId, moment: Moment, value: Signal) -> bool {
        let trace = self.traces.entry(net.clone()).or_default();
        match trace.last().copied() {
            Some((at, last)) if at == moment => {
                if last == value {
                    return false;
                }
                let len = trace.len();
                // A delta round may settle back to the previous moment's value.
                if len >= 2 && trace[len - 2].1 == value {
                    trace.pop();
                } else {
                    trace[len - 1].1 = value;
                }
                true
            }
            Some((_, last)) if last == value => false,
            _ => {
                trace.push((moment, value));
                true
            }
        }
    }

    /// Value of `net` at `moment`; floating before its first change.
    pub fn value_at(&self, net: &NetId, moment: Moment) -> Signal {
        self.traces
            .get(net)
            .and_then(|trace| trace.iter().rev().find(|(at, _)| *at <= moment))
            .map_or(Signal::Floating, |(_, value)| *value)
    }

    /// Latest recorded value of `net`.
    pub fn last_value(&self, net: &NetId) -> Signal {
        self.traces
            .get(net)
            .and_then(|trace| trace.last())
            .map_or(Signal::Floating, |(_, value)| *value)
    }

    /// Changes recorded for `net`, oldest first.
    pub fn trace(&self, net: &NetId) -> &[(Moment, Signal)] {
        self.traces.get(net).map_or(&[], Vec::as_slice)
    }

    pub fn nets(&self) -> impl Iterator<Item = &NetId> {
        self.traces.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }
}

/// One row per moment with any change, one column per net.
impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut moments: Vec<Moment> = self
            .traces
            .values()
            .flat_map(|trace| trace.iter().map(|(at, _)| *at))
            .collect();
        moments.sort();
        moments.dedup();

        let mut header = String::from("moment");
        for net in self.traces.keys() {
            write!(header, " {:>4}", net.as_str())?;
        }
        writeln!(f, "{header}")?;

        for moment in moments {
            let mut row = format!("{:>6}", moment.ticks());
            for net in self.traces.keys() {
                write!(row, " {:>4}", self.value_at(net, moment).to_string())?;
            }
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(id: &str) -> NetId {
        NetId::new(id)
    }

    #[test]
    fn test_records_changes_only() {
        let mut waveform = Waveform::new();
        assert!(waveform.record(&net("C"), Moment(0), Signal::Unknown));
        assert!(!waveform.record(&net("C"), Moment(0), Signal::Unknown));
        assert!(waveform.record(&net("C"), Moment(0), Signal::One));
        assert!(!waveform.record(&net("C"), Moment(3), Signal::One));
        assert!(waveform.record(&net("C"), Moment(5), Signal::Zero));

        assert_eq!(
            waveform.trace(&net("C")),
            &[(Moment(0), Signal::One), (Moment(5), Signal::Zero)]
        );
        assert_eq!(waveform.value_at(&net("C"), Moment(4)), Signal::One);
        assert_eq!(waveform.value_at(&net("D"), Moment(4)), Signal::Floating);
        assert_eq!(waveform.last_value(&net("C")), Signal::Zero);
    }

    #[test]
    fn test_glitch_within_a_moment_is_collapsed() {
        let mut waveform = Waveform::new();
        waveform.record(&net("Q"), Moment(0), Signal::One);
        waveform.record(&net("Q"), Moment(7), Signal::Zero);
        waveform.record(&net("Q"), Moment(7), Signal::One);
        assert_eq!(waveform.trace(&net("Q")), &[(Moment(0), Signal::One)]);
    }

    #[test]
    fn test_display_table() {
        let mut waveform = Waveform::new();
        waveform.record(&net("A"), Moment(0), Signal::One);
        waveform.record(&net("B"), Moment(2), Signal::Zero);
        let text = waveform.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "moment    A    B");
        assert_eq!(lines[1], "     0    1    Z");
        assert_eq!(lines[2], "     2    1    0");
    }
}
