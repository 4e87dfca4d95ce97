use clap::Args;
use serde_json::Value;

use proforma_core::irr::{self, IrrInput};

use crate::input;

/// Arguments for a standalone IRR solve
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows (comma-separated, e.g. "-100,30,30,130")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<f64>>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        IrrInput { cash_flows }
    };

    let result = irr::solve_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
