//! Built-in logic models.
//!
//! Every model here implements [`netsim_core::Model`] and is registered in
//! [`builtin_catalog`] under its type selector:
//!
//! | Selector | Pins |
//! |---|---|
//! | `and2`, `or2`, `nand2`, `nor2`, `xor2`, `xnor2` | `a`, `b` → `q` |
//! | `not`, `buffer` | `a` → `q` |
//! | `dlatch_clrn` | `d`, `clk`, `clrn` → `q`, `qn` |
//! | `dff_clrn` | `d`, `clk`, `clrn` → `q`, `qn` |
//! | `half_adder` | `a`, `b` → `s`, `c` |
//! | `full_adder` | `a`, `b`, `cin` → `s`, `cout` |

mod composite;
mod flipflops;
mod gates;

pub use composite::{Composite, CompositeBuilder, MAX_SETTLE_ITERATIONS};
pub use flipflops::{EdgeFlipFlop, TransparentLatch};
pub use gates::{Gate, GateOp, Unary};

use netsim_core::{Model, ModelCatalog, NetlistError};

/// `a + b` → sum `s`, carry `c`.
pub fn half_adder() -> Composite {
    Composite::builder("half_adder")
        .input("a")
        .input("b")
        .output("s")
        .output("c")
        .child(Gate::new(GateOp::Xor), &[("a", "a"), ("b", "b"), ("q", "s")])
        .child(Gate::new(GateOp::And), &[("a", "a"), ("b", "b"), ("q", "c")])
        .build()
}

/// `a + b + cin` → sum `s`, carry `cout`, from two half adders.
pub fn full_adder() -> Composite {
    Composite::builder("full_adder")
        .input("a")
        .input("b")
        .input("cin")
        .output("s")
        .output("cout")
        .child(half_adder(), &[("a", "a"), ("b", "b"), ("s", "s1"), ("c", "c1")])
        .child(half_adder(), &[("a", "s1"), ("b", "cin"), ("s", "s"), ("c", "c2")])
        .child(Gate::new(GateOp::Or), &[("a", "c1"), ("b", "c2"), ("q", "cout")])
        .build()
}

fn and2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::And))
}
fn or2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::Or))
}
fn nand2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::Nand))
}
fn nor2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::Nor))
}
fn xor2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::Xor))
}
fn xnor2() -> Box<dyn Model> {
    Box::new(Gate::new(GateOp::Xnor))
}
fn not() -> Box<dyn Model> {
    Box::new(Unary::inverter())
}
fn buffer() -> Box<dyn Model> {
    Box::new(Unary::buffer())
}
fn dlatch_clrn() -> Box<dyn Model> {
    Box::new(TransparentLatch::new())
}
fn dff_clrn() -> Box<dyn Model> {
    Box::new(EdgeFlipFlop::new())
}
fn boxed_half_adder() -> Box<dyn Model> {
    Box::new(half_adder())
}
fn boxed_full_adder() -> Box<dyn Model> {
    Box::new(full_adder())
}

/// Add every built-in model to `catalog`.
pub fn register_builtins(catalog: &mut ModelCatalog) -> Result<(), NetlistError> {
    catalog.register("and2", and2)?;
    catalog.register("or2", or2)?;
    catalog.register("nand2", nand2)?;
    catalog.register("nor2", nor2)?;
    catalog.register("xor2", xor2)?;
    catalog.register("xnor2", xnor2)?;
    catalog.register("not", not)?;
    catalog.register("buffer", buffer)?;
    catalog.register("dlatch_clrn", dlatch_clrn)?;
    catalog.register("dff_clrn", dff_clrn)?;
    catalog.register("half_adder", boxed_half_adder)?;
    catalog.register("full_adder", boxed_full_adder)?;
    Ok(())
}

/// A catalog holding only the built-in models.
pub fn builtin_catalog() -> Result<ModelCatalog, NetlistError> {
    let mut catalog = ModelCatalog::new();
    register_builtins(&mut catalog)?;
    Ok(catalog)
}
