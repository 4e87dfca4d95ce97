mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::distribution::DistributionArgs;
use commands::irr::IrrArgs;
use commands::simulate::SimulateArgs;

/// Monte Carlo underwriting for commercial real-estate acquisitions
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Monte Carlo underwriting for commercial real-estate acquisitions",
    long_about = "A CLI for probabilistic underwriting of a single-asset CRE acquisition. \
                  Samples exit cap rate and rent growth from forecast distributions, \
                  propagates them through a cash-flow model, and solves per-trial IRR \
                  to produce outcome distributions and probability-of-loss queries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full Monte Carlo simulation batch
    Simulate(SimulateArgs),
    /// Solve the IRR of one cash-flow vector
    Irr(IrrArgs),
    /// Bucket and summarize a set of values
    Distribution(DistributionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Distribution(args) => commands::distribution::run_distribution(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
