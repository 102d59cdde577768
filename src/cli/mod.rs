//! driftlens CLI - Column-wise Statistical Drift Detection
//!
//! Command-line interface for driftlens operations.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod basic;
mod drift;

pub use drift::{DetectArgs, OutputFormat};

/// driftlens - Column-wise Statistical Drift Detection in Pure Rust
#[derive(Parser)]
#[command(name = "driftlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect drift between a reference and a comparison dataset
    Detect(DetectArgs),
    /// Show how each column of a dataset would be tested
    Classify {
        /// Path to dataset file (Parquet/CSV/JSON)
        path: PathBuf,
    },
}

/// Log events go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    // a host that already installed a subscriber keeps it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the driftlens CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Detect(args) => drift::cmd_detect(&args),
        Commands::Classify { path } => basic::cmd_classify(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
