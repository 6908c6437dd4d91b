//! A simulation node.
//!
//! A [`Node`] owns one partition of the circuit. [`NodeListener`] answers
//! coordinator requests against it, [`BroadcastListener`] applies control
//! broadcasts, and [`BusPropagator`] fans locally driven net values out to
//! the nodes listening on them. [`spawn_node`] ties these together on a
//! single tokio task per node.

mod broadcast;
mod config;
mod listener;
mod node;
mod propagator;
mod runner;

pub use broadcast::{BroadcastListener, BroadcastOutcome};
pub use config::NodeConfig;
pub use listener::NodeListener;
pub use node::Node;
pub use propagator::BusPropagator;
pub use runner::{spawn_node, NodeHandle};
