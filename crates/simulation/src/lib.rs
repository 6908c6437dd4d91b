//! Distributed simulation driver.
//!
//! The [`Coordinator`] owns the event queue, the stimulus and the recorded
//! waveform, and advances every node through the phases one moment at a
//! time:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Coordinator                         │
//! │   EventQueue (moment → node → nets)    Stimulus          │
//! └───────┬──────────────────────────────────────────────────┘
//!         │  per round, to every node in parallel:
//!         │  PropagateInputs → PropagateOutputs → UpdateModels
//!         ▼
//! ┌──────────────┐   ScheduleNetValue   ┌──────────────┐
//! │   node-0     │ ───────────────────▶ │   node-1     │
//! │ NetlistDriver│ ◀─────────────────── │ NetlistDriver│
//! └──────────────┘      (per net)       └──────────────┘
//! ```
//!
//! [`Cluster`] wires nodes and a coordinator together on an in-memory bus,
//! and [`Circuit`] loads devices and stimulus from TOML.

mod circuit;
mod cluster;
mod config;
mod coordinator;
mod error;
mod event_queue;
mod waveform;

pub use circuit::{Circuit, CircuitError, DeviceSpec, Stimulus};
pub use cluster::Cluster;
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, RunReport, StepReport};
pub use error::CoordinatorError;
pub use event_queue::EventQueue;
pub use waveform::Waveform;
