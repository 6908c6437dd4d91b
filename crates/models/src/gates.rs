//! Combinational gates.
//!
//! Gates have no memory: outputs are recomputed from the current inputs on
//! every evaluation. A floating input reads as unknown, and no gate ever
//! drives its output floating.

use netsim_core::{level, Levels, Model, PinSpec};
use netsim_types::Signal;

/// Two-input boolean function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
}

impl GateOp {
    /// Type selector the gate is registered under.
    pub fn selector(self) -> &'static str {
        match self {
            GateOp::And => "and2",
            GateOp::Or => "or2",
            GateOp::Nand => "nand2",
            GateOp::Nor => "nor2",
            GateOp::Xor => "xor2",
            GateOp::Xnor => "xnor2",
        }
    }

    pub fn apply(self, a: Signal, b: Signal) -> Signal {
        match self {
            GateOp::And => a.and(b),
            GateOp::Or => a.or(b),
            GateOp::Nand => a.and(b).not(),
            GateOp::Nor => a.or(b).not(),
            GateOp::Xor => a.xor(b),
            GateOp::Xnor => a.xor(b).not(),
        }
    }
}

/// Two-input gate with pins `a`, `b` → `q`.
#[derive(Debug, Clone)]
pub struct Gate {
    op: GateOp,
}

impl Gate {
    pub fn new(op: GateOp) -> Self {
        Self { op }
    }
}

impl Model for Gate {
    fn kind(&self) -> &str {
        self.op.selector()
    }

    fn pins(&self) -> Vec<PinSpec> {
        vec![PinSpec::input("a"), PinSpec::input("b"), PinSpec::output("q")]
    }

    fn evaluate(&mut self, inputs: &Levels) -> Levels {
        let q = self.op.apply(level(inputs, "a"), level(inputs, "b"));
        Levels::from([("q".to_string(), q)])
    }

    fn reset(&mut self) {}
}

/// Single-input gate with pins `a` → `q`: either a buffer or an inverter.
#[derive(Debug, Clone)]
pub struct Unary {
    invert: bool,
}

impl Unary {
    pub fn buffer() -> Self {
        Self { invert: false }
    }

    pub fn inverter() -> Self {
        Self { invert: true }
    }
}

impl Model for Unary {
    fn kind(&self) -> &str {
        if self.invert {
            "not"
        } else {
            "buffer"
        }
    }

    fn pins(&self) -> Vec<PinSpec> {
        vec![PinSpec::input("a"), PinSpec::output("q")]
    }

    fn evaluate(&mut self, inputs: &Levels) -> Levels {
        let a = level(inputs, "a").sampled();
        let q = if self.invert { a.not() } else { a };
        Levels::from([("q".to_string(), q)])
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use Signal::*;

    fn eval(model: &mut dyn Model, a: Signal, b: Signal) -> Signal {
        let inputs = Levels::from([("a".to_string(), a), ("b".to_string(), b)]);
        model.evaluate(&inputs)["q"]
    }

    #[test]
    fn test_and_truth_table() {
        let mut g = Gate::new(GateOp::And);
        assert_eq!(eval(&mut g, Zero, Zero), Zero);
        assert_eq!(eval(&mut g, One, Zero), Zero);
        assert_eq!(eval(&mut g, One, One), One);
        assert_eq!(eval(&mut g, Zero, Unknown), Zero);
        assert_eq!(eval(&mut g, Floating, Zero), Zero);
        assert_eq!(eval(&mut g, One, Floating), Unknown);
    }

    #[test]
    fn test_or_and_negations() {
        let mut or = Gate::new(GateOp::Or);
        assert_eq!(eval(&mut or, One, Floating), One);
        assert_eq!(eval(&mut or, Zero, Floating), Unknown);

        let mut nand = Gate::new(GateOp::Nand);
        assert_eq!(eval(&mut nand, One, One), Zero);
        assert_eq!(eval(&mut nand, Zero, Unknown), One);

        let mut nor = Gate::new(GateOp::Nor);
        assert_eq!(eval(&mut nor, Zero, Zero), One);
        assert_eq!(eval(&mut nor, Unknown, One), Zero);
    }

    #[test]
    fn test_xnor_logic() {
        let mut g = Gate::new(GateOp::Xnor);
        assert_eq!(eval(&mut g, Zero, Zero), One);
        assert_eq!(eval(&mut g, Zero, One), Zero);
        assert_eq!(eval(&mut g, One, Zero), Zero);
        assert_eq!(eval(&mut g, One, One), One);

        // Anything not driven makes the result unknown
        for (a, b) in [
            (One, Floating),
            (Zero, Floating),
            (Unknown, Floating),
            (Floating, Floating),
            (Floating, One),
            (Floating, Zero),
            (Floating, Unknown),
            (Unknown, Unknown),
        ] {
            assert_eq!(eval(&mut g, a, b), Unknown, "xnor({a}, {b})");
        }
    }

    #[test]
    fn test_unary() {
        let mut inv = Unary::inverter();
        let mut buf = Unary::buffer();
        let levels = |a: Signal| Levels::from([("a".to_string(), a)]);
        assert_eq!(inv.evaluate(&levels(One))["q"], Zero);
        assert_eq!(buf.evaluate(&levels(One))["q"], One);
        assert_eq!(buf.evaluate(&levels(Floating))["q"], Unknown);
        assert_eq!(inv.kind(), "not");
    }
}
