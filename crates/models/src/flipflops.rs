//! Sequential elements with an active-low asynchronous clear.
//!
//! Both elements share the clear rule: `clrn` low forces `q` to zero, and an
//! undriven or unknown `clrn` makes `q` unknown. `qn` is always the
//! complement of `q`. Outputs start unknown.

use netsim_core::{level, Levels, Model, PinSpec};
use netsim_types::Signal;

fn pins() -> Vec<PinSpec> {
    vec![
        PinSpec::input("d"),
        PinSpec::input("clk"),
        PinSpec::input("clrn"),
        PinSpec::output("q"),
        PinSpec::output("qn"),
    ]
}

fn outputs(q: Signal) -> Levels {
    Levels::from([("q".to_string(), q), ("qn".to_string(), q.not())])
}

/// Resolve the async clear. `None` means the clear is released.
fn cleared(clrn: Signal) -> Option<Signal> {
    match clrn.as_bool() {
        Some(true) => None,
        Some(false) => Some(Signal::Zero),
        None => Some(Signal::Unknown),
    }
}

/// The held value survives an uncertain control input only if data agrees.
fn hold_if_agrees(held: Signal, d: Signal) -> Signal {
    if held == d {
        held
    } else {
        Signal::Unknown
    }
}

/// Level-sensitive D latch, transparent while `clk` is low.
///
/// Pins: `d`, `clk`, `clrn` → `q`, `qn`.
#[derive(Debug, Clone)]
pub struct TransparentLatch {
    q: Signal,
}

impl TransparentLatch {
    pub fn new() -> Self {
        Self { q: Signal::Unknown }
    }
}

impl Default for TransparentLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for TransparentLatch {
    fn kind(&self) -> &str {
        "dlatch_clrn"
    }

    fn pins(&self) -> Vec<PinSpec> {
        pins()
    }

    fn evaluate(&mut self, inputs: &Levels) -> Levels {
        let d = level(inputs, "d").sampled();
        let clk = level(inputs, "clk");

        self.q = match cleared(level(inputs, "clrn")) {
            Some(forced) => forced,
            None => match clk.as_bool() {
                Some(false) => d,
                Some(true) => self.q,
                None => hold_if_agrees(self.q, d),
            },
        };
        outputs(self.q)
    }

    fn reset(&mut self) {
        self.q = Signal::Unknown;
    }
}

/// Rising-edge D flip-flop.
///
/// Pins: `d`, `clk`, `clrn` → `q`, `qn`. Captures `d` on a clean 0 → 1
/// transition of `clk`. A transition that might have been a rising edge
/// (through unknown or floating) keeps `q` only if `d` already matches it.
#[derive(Debug, Clone)]
pub struct EdgeFlipFlop {
    q: Signal,
    last_clk: Signal,
}

impl EdgeFlipFlop {
    pub fn new() -> Self {
        Self {
            q: Signal::Unknown,
            last_clk: Signal::Floating,
        }
    }
}

impl Default for EdgeFlipFlop {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for EdgeFlipFlop {
    fn kind(&self) -> &str {
        "dff_clrn"
    }

    fn pins(&self) -> Vec<PinSpec> {
        pins()
    }

    fn evaluate(&mut self, inputs: &Levels) -> Levels {
        let d = level(inputs, "d").sampled();
        let clk = level(inputs, "clk");
        let prev = std::mem::replace(&mut self.last_clk, clk);

        self.q = match cleared(level(inputs, "clrn")) {
            Some(forced) => forced,
            None if prev == Signal::Zero && clk == Signal::One => d,
            None if prev != clk && prev != Signal::One && clk != Signal::Zero => {
                hold_if_agrees(self.q, d)
            }
            None => self.q,
        };
        outputs(self.q)
    }

    fn reset(&mut self) {
        self.q = Signal::Unknown;
        self.last_clk = Signal::Floating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Signal::*;

    /// Apply `(d, clk, clrn)` and return `(q, qn)`.
    fn apply(model: &mut dyn Model, d: Signal, clk: Signal, clrn: Signal) -> (Signal, Signal) {
        let inputs = Levels::from([
            ("d".to_string(), d),
            ("clk".to_string(), clk),
            ("clrn".to_string(), clrn),
        ]);
        let out = model.evaluate(&inputs);
        (out["q"], out["qn"])
    }

    #[test]
    fn test_latch_ignores_d_when_clk_high() {
        let mut ff = TransparentLatch::new();
        assert_eq!(apply(&mut ff, Zero, Zero, One), (Zero, One));
        assert_eq!(apply(&mut ff, Zero, One, One), (Zero, One));

        for d in [One, Floating, Unknown] {
            assert_eq!(apply(&mut ff, d, One, One), (Zero, One), "d={d}");
        }
    }

    #[test]
    fn test_latch_follows_d_when_clk_low() {
        let mut ff = TransparentLatch::new();
        assert_eq!(apply(&mut ff, Zero, Zero, One), (Zero, One));
        assert_eq!(apply(&mut ff, One, Zero, One), (One, Zero));
        // Floating data shows up as unknown
        assert_eq!(apply(&mut ff, Floating, Zero, One), (Unknown, Unknown));
        assert_eq!(apply(&mut ff, Unknown, Zero, One), (Unknown, Unknown));
        // Back to a driven level straight away
        assert_eq!(apply(&mut ff, Zero, Zero, One), (Zero, One));
    }

    #[test]
    fn test_latch_passes_undriven_data_from_a_known_state() {
        let mut ff = TransparentLatch::new();
        assert_eq!(apply(&mut ff, One, Zero, One), (One, Zero));
        assert_eq!(apply(&mut ff, Unknown, Zero, One), (Unknown, Unknown));

        let mut ff = TransparentLatch::new();
        assert_eq!(apply(&mut ff, Zero, Zero, One), (Zero, One));
        assert_eq!(apply(&mut ff, Floating, Zero, One), (Unknown, Unknown));
    }

    #[test]
    fn test_latch_clear() {
        let mut ff = TransparentLatch::new();
        assert_eq!(apply(&mut ff, One, Zero, One), (One, Zero));
        assert_eq!(apply(&mut ff, One, One, One), (One, Zero));
        // clrn low overrides the held value
        assert_eq!(apply(&mut ff, One, One, Zero), (Zero, One));
        // clrn floating or unknown gives unknown
        assert_eq!(apply(&mut ff, One, One, Floating), (Unknown, Unknown));
        assert_eq!(apply(&mut ff, One, One, Unknown), (Unknown, Unknown));
        // Clear also wins while transparent
        assert_eq!(apply(&mut ff, One, Zero, Zero), (Zero, One));
    }

    #[test]
    fn test_latch_uncertain_clock() {
        let mut ff = TransparentLatch::new();
        apply(&mut ff, One, Zero, One);
        assert_eq!(apply(&mut ff, One, Unknown, One), (One, Zero));
        assert_eq!(apply(&mut ff, Zero, Floating, One), (Unknown, Unknown));
    }

    #[test]
    fn test_latch_reset() {
        let mut ff = TransparentLatch::new();
        apply(&mut ff, One, Zero, One);
        ff.reset();
        assert_eq!(apply(&mut ff, One, One, One), (Unknown, Unknown));
    }

    #[test]
    fn test_dff_captures_on_rising_edge_only() {
        let mut ff = EdgeFlipFlop::new();
        assert_eq!(apply(&mut ff, One, Zero, One), (Unknown, Unknown));
        assert_eq!(apply(&mut ff, One, One, One), (One, Zero));
        // Data changes without an edge are ignored
        assert_eq!(apply(&mut ff, Zero, One, One), (One, Zero));
        assert_eq!(apply(&mut ff, Zero, Zero, One), (One, Zero));
        assert_eq!(apply(&mut ff, Zero, One, One), (Zero, One));
    }

    #[test]
    fn test_dff_uncertain_edge() {
        let mut ff = EdgeFlipFlop::new();
        apply(&mut ff, One, Zero, One);
        apply(&mut ff, One, One, One);
        apply(&mut ff, One, Zero, One);

        // 0 -> X with matching data keeps q
        assert_eq!(apply(&mut ff, One, Unknown, One), (One, Zero));
        // X -> 1 with different data loses it
        assert_eq!(apply(&mut ff, Zero, One, One), (Unknown, Unknown));
    }

    #[test]
    fn test_dff_clear_precedence() {
        let mut ff = EdgeFlipFlop::new();
        apply(&mut ff, One, Zero, One);
        assert_eq!(apply(&mut ff, One, One, Zero), (Zero, One));
        assert_eq!(apply(&mut ff, One, One, Floating), (Unknown, Unknown));
    }
}
