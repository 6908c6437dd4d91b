//! Sample circuit descriptions in the TOML circuit format.

/// A single AND gate: `A & B → C`, with both inputs driven high at moment 0.
pub const AND_GATE: &str = r#"
[[devices]]
type = "and2"
unit = "g1"
pins = { a = "A", b = "B", q = "C" }

[[stimulus]]
at = 0
net = "A"
value = "1"

[[stimulus]]
at = 0
net = "B"
value = "1"
"#;

/// A chain split across two nodes: `A & B → C` on node-0, `!C → D` on node-1.
pub const SPLIT_CHAIN: &str = r#"
[[devices]]
type = "and2"
unit = "g1"
node = "node-0"
pins = { a = "A", b = "B", q = "C" }

[[devices]]
type = "not"
unit = "g2"
node = "node-1"
pins = { a = "C", q = "D" }

[[stimulus]]
at = 0
net = "A"
value = "1"

[[stimulus]]
at = 0
net = "B"
value = "1"

[[stimulus]]
at = 5
net = "B"
value = "0"
"#;

/// A half adder built from gates, one gate per device so it spreads across
/// nodes, with inputs stepping through 00, 01, 10, 11.
pub const HALF_ADDER: &str = r#"
[[devices]]
type = "xor2"
unit = "sum"
pins = { a = "A", b = "B", q = "S" }

[[devices]]
type = "and2"
unit = "carry"
pins = { a = "A", b = "B", q = "C" }

[[stimulus]]
at = 0
net = "A"
value = "0"

[[stimulus]]
at = 0
net = "B"
value = "0"

[[stimulus]]
at = 10
net = "B"
value = "1"

[[stimulus]]
at = 20
net = "A"
value = "1"

[[stimulus]]
at = 20
net = "B"
value = "0"

[[stimulus]]
at = 30
net = "B"
value = "1"
"#;

/// A buffer and an inverter on different nodes both drive net `Y` from `A`,
/// so `Y` conflicts whenever `A` is known.
pub const WIRED_CONFLICT: &str = r#"
[[devices]]
type = "buffer"
unit = "drv0"
node = "node-0"
pins = { a = "A", q = "Y" }

[[devices]]
type = "not"
unit = "drv1"
node = "node-1"
pins = { a = "A", q = "Y" }

[[devices]]
type = "buffer"
unit = "sense"
node = "node-0"
pins = { a = "Y", q = "Z" }

[[stimulus]]
at = 0
net = "A"
value = "1"
"#;

/// A transparent latch: data follows while `clk` is low, holds while high.
pub const LATCH: &str = r#"
[[devices]]
type = "dlatch_clrn"
unit = "l1"
pins = { d = "D", clk = "CLK", clrn = "CLRN", q = "Q", qn = "QN" }

[[stimulus]]
at = 0
net = "CLRN"
value = "1"

[[stimulus]]
at = 0
net = "CLK"
value = "0"

[[stimulus]]
at = 0
net = "D"
value = "1"

[[stimulus]]
at = 10
net = "CLK"
value = "1"

[[stimulus]]
at = 20
net = "D"
value = "0"

[[stimulus]]
at = 30
net = "CLRN"
value = "0"
"#;
