use clap::Args;
use serde_json::Value;

use proforma_core::simulation;
use proforma_core::types::SimulationInput;

use crate::input;

/// Arguments for a full Monte Carlo simulation batch
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the trial count from the input file
    #[arg(long)]
    pub trials: Option<u32>,

    /// Override the random seed from the input file
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sim_input: SimulationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for simulation".into());
    };

    if let Some(trials) = args.trials {
        sim_input.num_trials = trials;
    }
    if let Some(seed) = args.seed {
        sim_input.seed = Some(seed);
    }

    let result = simulation::run_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
