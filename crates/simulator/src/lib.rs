//! netsim simulator
//!
//! Loads a TOML circuit, spreads its devices over an in-process cluster of
//! nodes, runs it to a given moment and reports the waveform.
//!
//! # Example
//!
//! ```ignore
//! use netsim_simulator::{Simulator, SimulatorConfig};
//! use netsim_types::Moment;
//!
//! let config = SimulatorConfig::new("adder.toml")
//!     .with_nodes(3)
//!     .with_until(Moment(100));
//!
//! let report = Simulator::new(config).run().await?;
//! println!("{report}");
//! ```

pub mod config;
pub mod runner;

pub use config::SimulatorConfig;
pub use runner::{describe_catalog, SimulationReport, Simulator};
