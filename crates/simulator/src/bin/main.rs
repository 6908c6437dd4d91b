//! netsim-sim: run a circuit description on an in-process cluster.

use anyhow::Context;
use clap::{Parser, Subcommand};
use netsim_models::builtin_catalog;
use netsim_simulation::CoordinatorConfig;
use netsim_simulator::{describe_catalog, Simulator, SimulatorConfig};
use netsim_types::Moment;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netsim-sim")]
#[command(about = "Distributed four-valued logic simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a circuit and print its waveform
    Run {
        /// TOML circuit description
        #[arg(short, long)]
        circuit: PathBuf,

        /// Number of nodes (more are added for explicit placements)
        #[arg(short, long, default_value = "2")]
        nodes: usize,

        /// Last moment to simulate
        #[arg(short, long, default_value = "100")]
        until: u64,

        /// How long to wait for each node reply (e.g. "500ms", "2s")
        #[arg(long, default_value = "2s")]
        phase_timeout: humantime::Duration,

        /// Retries after a timed out request
        #[arg(long, default_value = "2")]
        max_retries: u32,

        /// Rounds allowed at one moment before giving up
        #[arg(long, default_value = "64")]
        max_delta_rounds: u32,
    },

    /// List the installable model types
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog => {
            let catalog = builtin_catalog()?;
            for line in describe_catalog(&catalog)? {
                println!("{line}");
            }
        }

        Commands::Run {
            circuit,
            nodes,
            until,
            phase_timeout,
            max_retries,
            max_delta_rounds,
        } => {
            init_tracing();

            let coordinator = CoordinatorConfig::default()
                .with_phase_timeout(phase_timeout.into())
                .with_max_retries(max_retries)
                .with_max_delta_rounds(max_delta_rounds);
            let config = SimulatorConfig::new(&circuit)
                .with_nodes(nodes)
                .with_until(Moment(until))
                .with_coordinator(coordinator);

            let report = Simulator::new(config)
                .run()
                .await
                .with_context(|| format!("simulating {}", circuit.display()))?;
            print!("{report}");
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
