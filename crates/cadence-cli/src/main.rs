//! CLI frontend for the Cadence dataset simulator.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Cadence: synthetic event datasets from seeded simulations",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and summarize what it produced
    Run {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Number of ticks (default: the scenario's, else 24)
        #[arg(short = 'n', long)]
        steps: Option<u64>,

        /// RNG seed, overriding the scenario's
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print every event
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a scenario without running it
    Check {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },

    /// Run a scenario and export the dataset
    Export {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Output format: sql, json
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of ticks (default: the scenario's, else 24)
        #[arg(short = 'n', long)]
        steps: Option<u64>,

        /// RNG seed, overriding the scenario's
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print the CREATE TABLE statements of a scenario's export
    Schema {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario,
            steps,
            seed,
            verbose,
        } => commands::run::run(&scenario, steps, seed, verbose),
        Commands::Check { scenario } => commands::check::run(&scenario),
        Commands::Export {
            scenario,
            format,
            output,
            steps,
            seed,
        } => commands::export::run(&scenario, &format, output.as_deref(), steps, seed),
        Commands::Schema { scenario } => commands::schema::run(&scenario),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
