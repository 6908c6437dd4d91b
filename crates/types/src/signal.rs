//! Four-valued logic signals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A logic level on a pin or net.
///
/// `Zero` and `One` are actively driven levels. `Unknown` is a driven level
/// whose value cannot be determined (conflict, uninitialised state).
/// `Floating` is high impedance: nothing is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signal {
    /// Driven low.
    #[serde(rename = "0")]
    Zero,
    /// Driven high.
    #[serde(rename = "1")]
    One,
    /// Driven, value undetermined.
    #[serde(rename = "X")]
    Unknown,
    /// High impedance.
    #[serde(rename = "Z")]
    Floating,
}

impl Signal {
    /// Map a boolean onto a driven level.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Signal::One
        } else {
            Signal::Zero
        }
    }

    /// The boolean value of a driven level, `None` for `Unknown`/`Floating`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Signal::Zero => Some(false),
            Signal::One => Some(true),
            Signal::Unknown | Signal::Floating => None,
        }
    }

    /// True for `Zero` and `One`.
    pub fn is_known(self) -> bool {
        self.as_bool().is_some()
    }

    /// How a gate input reads this level: a floating input is indeterminate.
    pub fn sampled(self) -> Self {
        match self {
            Signal::Floating => Signal::Unknown,
            other => other,
        }
    }

    /// Combine two drivers on the same net.
    ///
    /// `Floating` is the identity, `Unknown` absorbs everything, and two
    /// disagreeing driven levels conflict to `Unknown`. The operation is
    /// commutative, associative and idempotent.
    pub fn combine(self, other: Signal) -> Signal {
        match (self, other) {
            (Signal::Floating, s) | (s, Signal::Floating) => s,
            (Signal::Unknown, _) | (_, Signal::Unknown) => Signal::Unknown,
            (a, b) if a == b => a,
            _ => Signal::Unknown,
        }
    }

    /// Logical inversion.
    pub fn not(self) -> Signal {
        match self.as_bool() {
            Some(b) => Signal::from_bool(!b),
            None => Signal::Unknown,
        }
    }

    /// Logical AND; a known `Zero` dominates.
    pub fn and(self, other: Signal) -> Signal {
        match (self.sampled(), other.sampled()) {
            (Signal::Zero, _) | (_, Signal::Zero) => Signal::Zero,
            (Signal::One, Signal::One) => Signal::One,
            _ => Signal::Unknown,
        }
    }

    /// Logical OR; a known `One` dominates.
    pub fn or(self, other: Signal) -> Signal {
        match (self.sampled(), other.sampled()) {
            (Signal::One, _) | (_, Signal::One) => Signal::One,
            (Signal::Zero, Signal::Zero) => Signal::Zero,
            _ => Signal::Unknown,
        }
    }

    /// Logical XOR; undetermined unless both inputs are known.
    pub fn xor(self, other: Signal) -> Signal {
        match (self.as_bool(), other.as_bool()) {
            (Some(a), Some(b)) => Signal::from_bool(a != b),
            _ => Signal::Unknown,
        }
    }
}

/// Resolve the value of a net from all of its active drivers.
///
/// Zero drivers, or only floating drivers, resolve to `Floating`.
pub fn resolve<I>(drivers: I) -> Signal
where
    I: IntoIterator<Item = Signal>,
{
    drivers
        .into_iter()
        .fold(Signal::Floating, |acc, s| acc.combine(s))
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Signal::Zero => "0",
            Signal::One => "1",
            Signal::Unknown => "X",
            Signal::Floating => "Z",
        };
        f.write_str(c)
    }
}

/// Error parsing a [`Signal`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid signal level '{0}', expected one of 0, 1, X, Z")]
pub struct ParseSignalError(pub String);

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Signal::Zero),
            "1" => Ok(Signal::One),
            "x" | "X" => Ok(Signal::Unknown),
            "z" | "Z" => Ok(Signal::Floating),
            other => Err(ParseSignalError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Signal::*;

    const ALL: [Signal; 4] = [Zero, One, Unknown, Floating];

    #[test]
    fn test_resolve_empty_is_floating() {
        assert_eq!(resolve(Vec::<Signal>::new()), Floating);
    }

    #[test]
    fn test_resolve_single_driver() {
        for s in ALL {
            assert_eq!(resolve([s]), s);
        }
    }

    #[test]
    fn test_resolve_conflict() {
        assert_eq!(resolve([Zero, One]), Unknown);
        assert_eq!(resolve([One, Floating, Floating, Floating]), One);
        assert_eq!(resolve([Floating, Floating]), Floating);
        assert_eq!(resolve([One, One, Unknown]), Unknown);
        assert_eq!(resolve([Zero, Floating, Zero]), Zero);
    }

    #[test]
    fn test_resolve_is_order_independent() {
        // Every ordering of every 3-driver multiset resolves identically.
        for a in ALL {
            for b in ALL {
                for c in ALL {
                    let expected = resolve([a, b, c]);
                    for perm in [[a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]] {
                        assert_eq!(resolve(perm), expected, "{a}{b}{c} vs {perm:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_combine_associative() {
        for a in ALL {
            for b in ALL {
                for c in ALL {
                    assert_eq!(a.combine(b).combine(c), a.combine(b.combine(c)));
                }
            }
        }
    }

    #[test]
    fn test_gate_ops() {
        assert_eq!(Zero.and(Unknown), Zero);
        assert_eq!(One.and(Floating), Unknown);
        assert_eq!(One.or(Floating), One);
        assert_eq!(Zero.or(Floating), Unknown);
        assert_eq!(One.xor(Zero), One);
        assert_eq!(One.xor(Floating), Unknown);
        assert_eq!(Floating.not(), Unknown);
        assert_eq!(Zero.not(), One);
    }

    #[test]
    fn test_parse_and_display() {
        for s in ALL {
            assert_eq!(s.to_string().parse::<Signal>(), Ok(s));
        }
        assert_eq!("z".parse::<Signal>(), Ok(Floating));
        assert!("2".parse::<Signal>().is_err());
    }

    #[test]
    fn test_serde_uses_level_names() {
        let json = serde_json::to_string(&[Zero, One, Unknown, Floating]).unwrap();
        assert_eq!(json, r#"["0","1","X","Z"]"#);
    }
}
