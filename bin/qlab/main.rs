//! qlab - Quantum Lab CLI
//!
//! Interactive wizard for configuring and running simulated
//! quantum-chemistry experiments, plus read-only commands against the
//! computation service.

mod commands;
mod style;
mod wizard;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quantum_lab::LabConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qlab", version, about = "Quantum Lab - simulated quantum chemistry experiments")]
struct Cli {
    /// Computation service root URL (overrides config file)
    #[arg(long, env = "QLAB_API_URL", global = true)]
    api_url: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = "QLAB_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive experiment wizard (default)
    Wizard,
    /// List selectable systems, basis sets or experiment types
    Catalog {
        /// systems, basis-sets or experiment-types (all when omitted)
        kind: Option<String>,
    },
    /// Show stored experiment results
    Results {
        /// A single result
        #[arg(long, conflicts_with = "experiment")]
        id: Option<i64>,
        /// All results of one experiment
        #[arg(long)]
        experiment: Option<i64>,
        /// Include system name and configuration (with --id)
        #[arg(long, requires = "id")]
        details: bool,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Estimate resources for a system locally
    Estimate {
        #[arg(long)]
        system: String,
        #[arg(long, default_value = "sto-3g")]
        basis: String,
        #[arg(long, default_value = "ground")]
        experiment_type: String,
    },
    /// Check the computation service
    Health,
}

pub fn print_banner() {
    println!(
        "{}",
        console::style(
            r#"
   ██████╗ ██╗      █████╗ ██████╗
  ██╔═══██╗██║     ██╔══██╗██╔══██╗
  ██║   ██║██║     ███████║██████╔╝
  ██║▄▄ ██║██║     ██╔══██║██╔══██╗
  ╚██████╔╝███████╗██║  ██║██████╔╝
   ╚══▀▀═╝ ╚══════╝╚═╝  ╚═╝╚═════╝
"#
        )
        .magenta()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = LabConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    match cli.command.unwrap_or(Commands::Wizard) {
        Commands::Wizard => wizard::run_wizard(&config).await,
        Commands::Catalog { kind } => commands::catalog::run(&config, kind.as_deref()).await,
        Commands::Results {
            id,
            experiment,
            details,
            skip,
            limit,
        } => commands::results::run(&config, id, experiment, details, skip, limit).await,
        Commands::Estimate {
            system,
            basis,
            experiment_type,
        } => commands::estimate::run(&system, &basis, &experiment_type),
        Commands::Health => commands::health::run(&config).await,
    }
}
