use clap::Args;
use serde_json::Value;

use proforma_core::aggregate::{self, DistributionInput};

use crate::input;

/// Arguments for distribution analysis over a value set
#[derive(Args)]
pub struct DistributionArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Values to bucket (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Option<Vec<f64>>,

    /// Bucket width (e.g. 0.001 for IRR to three decimals)
    #[arg(long)]
    pub bucket_width: Option<f64>,

    /// Threshold for a probability-of-loss style query
    #[arg(long, allow_hyphen_values = true)]
    pub threshold: Option<f64>,
}

pub fn run_distribution(args: DistributionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dist_input: DistributionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let values = args
            .values
            .ok_or("--values is required (or provide --input)")?;
        let bucket_width = args
            .bucket_width
            .ok_or("--bucket-width is required (or provide --input)")?;
        DistributionInput {
            values,
            bucket_width,
            threshold: args.threshold,
        }
    };

    let result = aggregate::analyze_distribution(&dist_input)?;
    Ok(serde_json::to_value(result)?)
}
