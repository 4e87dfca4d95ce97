use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::aggregate::{self, DistributionBucket, MetricSummary, ThresholdProbability};
use crate::cash_flow;
use crate::error::ProformaError;
use crate::irr;
use crate::sampler;
use crate::types::{with_metadata_f64, ComputationOutput, SimulationInput, TrialResult};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Distribution summaries over the completed trials. A field is None when no
/// trial contributed a value to it (e.g. every IRR solve failed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Over trials with a solved IRR only.
    pub irr: Option<MetricSummary>,
    pub sale_price: Option<MetricSummary>,
    pub roi: Option<MetricSummary>,
    /// Exit-year NOI.
    pub terminal_noi: Option<MetricSummary>,
    /// P(ROI < 0) over completed trials.
    pub probability_of_loss: Option<ThresholdProbability>,
    /// P(IRR < hurdle), present when the input supplied a hurdle.
    pub irr_below_hurdle: Option<ThresholdProbability>,
}

/// Empirical distribution tables, present when the input supplied bucket
/// widths. The IRR table covers solved trials only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDistributions {
    pub irr: Vec<DistributionBucket>,
    pub roi: Vec<DistributionBucket>,
    pub sale_price: Vec<DistributionBucket>,
    pub terminal_noi: Vec<DistributionBucket>,
}

/// Output of a full simulation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub num_trials: u32,
    /// Trials actually run (less than num_trials only after cancellation).
    pub completed_trials: u32,
    /// Completed trials whose IRR solve failed; they stay in the per-trial
    /// table with irr = null and are left out of the IRR summary.
    pub excluded_trials: u32,
    pub trials: Vec<TrialResult>,
    pub summary: SimulationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributions: Option<SimulationDistributions>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn require_positive(field: &str, value: f64) -> ProformaResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ProformaError::InvalidParameter {
            field: field.into(),
            reason: format!("must be a positive finite number, got {value}"),
        });
    }
    Ok(())
}

fn validate(input: &SimulationInput) -> ProformaResult<()> {
    require_positive("purchase_price", input.purchase_price)?;
    require_positive("current_noi", input.current_noi)?;
    if input.holding_years == 0 {
        return Err(ProformaError::InvalidParameter {
            field: "holding_years".into(),
            reason: "must be at least 1".into(),
        });
    }
    if input.num_trials == 0 {
        return Err(ProformaError::InvalidParameter {
            field: "num_trials".into(),
            reason: "must be at least 1".into(),
        });
    }
    input
        .rent_growth
        .validate_horizon("rent_growth", input.holding_years)?;
    input.exit_cap.validate("exit_cap")?;
    if let Some(w) = &input.bucket_widths {
        for (field, width) in [
            ("bucket_widths.irr", w.irr),
            ("bucket_widths.roi", w.roi),
            ("bucket_widths.sale_price", w.sale_price),
            ("bucket_widths.terminal_noi", w.terminal_noi),
        ] {
            require_positive(field, width)?;
        }
    }
    if let Some(cal) = &input.growth_calibration {
        if !cal.std_dev.is_finite() || cal.std_dev < 0.0 {
            return Err(ProformaError::InvalidAssumption {
                field: "growth_calibration".into(),
                reason: format!("std_dev must be finite and >= 0, got {}", cal.std_dev),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-trial pipeline
// ---------------------------------------------------------------------------

/// Sample, assemble, and solve one trial. Pure function of the master seed
/// and trial index; safe to run on any worker in any order.
fn run_trial(input: &SimulationInput, master_seed: u64, trial: u32) -> ProformaResult<TrialResult> {
    let mut rng = sampler::trial_rng(master_seed, trial as u64);
    let n = input.holding_years as usize;

    let mut growth = Vec::with_capacity(n);
    for year in 1..=input.holding_years {
        let mut g = sampler::draw(&mut rng, input.rent_growth.period(year)?)?;
        if let Some(cal) = &input.growth_calibration {
            g *= sampler::draw_normal(&mut rng, cal.mean, cal.std_dev)?;
        }
        growth.push(g);
    }

    let exit_cap = sampler::draw_abs(&mut rng, &input.exit_cap)?;
    let flows = cash_flow::assemble_trial(input.purchase_price, input.current_noi, &growth, exit_cap);

    let irr_value = match irr::irr(&flows.cash_flows) {
        Ok(rate) => Some(rate),
        // A degenerate cash flow excludes this trial, not the batch
        Err(ProformaError::NoRootFound { .. }) => None,
        Err(e) => return Err(e),
    };

    let inflows: f64 = flows.cash_flows[1..].iter().sum();
    let roi = (inflows - input.purchase_price) / input.purchase_price;

    Ok(TrialResult {
        trial,
        exit_cap,
        terminal_growth: growth[n - 1],
        noi_path: flows.noi_path,
        sale_price: flows.sale_price,
        roi,
        irr: irr_value,
    })
}

fn is_live(cancel: Option<&AtomicBool>) -> bool {
    cancel.map_or(true, |flag| !flag.load(Ordering::Relaxed))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a full Monte Carlo underwriting batch.
///
/// Validation failures abort before any sampling. Per-trial IRR failures are
/// isolated: the trial is kept in the table with a null IRR and counted in
/// `excluded_trials`, and the run completes.
pub fn run_simulation(
    input: &SimulationInput,
) -> ProformaResult<ComputationOutput<SimulationOutput>> {
    run(input, None)
}

/// Like [`run_simulation`], but stops early once `cancel` is set. Trials
/// finished before the flag was observed stay valid and are summarized as a
/// snapshot; a warning records the truncation.
pub fn run_simulation_cancellable(
    input: &SimulationInput,
    cancel: &AtomicBool,
) -> ProformaResult<ComputationOutput<SimulationOutput>> {
    run(input, Some(cancel))
}

fn run(
    input: &SimulationInput,
    cancel: Option<&AtomicBool>,
) -> ProformaResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let master_seed = match input.seed {
        Some(s) => s,
        None => StdRng::from_entropy().gen(),
    };

    #[cfg(feature = "parallel")]
    let collected: ProformaResult<Vec<TrialResult>> = (0..input.num_trials)
        .into_par_iter()
        .filter(|_| is_live(cancel))
        .map(|i| run_trial(input, master_seed, i))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let collected: ProformaResult<Vec<TrialResult>> = (0..input.num_trials)
        .filter(|_| is_live(cancel))
        .map(|i| run_trial(input, master_seed, i))
        .collect();

    let mut trials = collected?;
    #[cfg(feature = "parallel")]
    trials.sort_by_key(|t| t.trial);

    let completed = trials.len() as u32;
    if completed < input.num_trials {
        warnings.push(format!(
            "run cancelled after {completed} of {} trials; summary is a snapshot",
            input.num_trials
        ));
    }

    let excluded = trials.iter().filter(|t| t.irr.is_none()).count() as u32;
    if excluded > 0 {
        warnings.push(format!(
            "{excluded} of {completed} trials excluded (no IRR root found)"
        ));
    }

    let irr_values: Vec<f64> = trials.iter().filter_map(|t| t.irr).collect();
    let sale_prices: Vec<f64> = trials.iter().map(|t| t.sale_price).collect();
    let rois: Vec<f64> = trials.iter().map(|t| t.roi).collect();
    let terminal_nois: Vec<f64> = trials
        .iter()
        .filter_map(|t| t.noi_path.last().copied())
        .collect();

    let probability_of_loss = if rois.is_empty() {
        None
    } else {
        Some(ThresholdProbability {
            threshold: 0.0,
            probability: aggregate::probability_below(&rois, 0.0),
        })
    };
    let irr_below_hurdle = match input.irr_hurdle {
        Some(hurdle) if !irr_values.is_empty() => Some(ThresholdProbability {
            threshold: hurdle,
            probability: aggregate::probability_below(&irr_values, hurdle),
        }),
        _ => None,
    };

    let distributions = match &input.bucket_widths {
        Some(w) => Some(SimulationDistributions {
            irr: aggregate::empirical_distribution(&irr_values, w.irr)?,
            roi: aggregate::empirical_distribution(&rois, w.roi)?,
            sale_price: aggregate::empirical_distribution(&sale_prices, w.sale_price)?,
            terminal_noi: aggregate::empirical_distribution(&terminal_nois, w.terminal_noi)?,
        }),
        None => None,
    };

    let summary = SimulationSummary {
        irr: summarize_or_none(irr_values),
        sale_price: summarize_or_none(sale_prices),
        roi: summarize_or_none(rois),
        terminal_noi: summarize_or_none(terminal_nois),
        probability_of_loss,
        irr_below_hurdle,
    };

    let output = SimulationOutput {
        num_trials: input.num_trials,
        completed_trials: completed,
        excluded_trials: excluded,
        trials,
        summary,
        distributions,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo CRE Acquisition Underwriting",
        &serde_json::json!({
            "purchase_price": input.purchase_price,
            "current_noi": input.current_noi,
            "holding_years": input.holding_years,
            "num_trials": input.num_trials,
            "seed": master_seed,
            "irr_hurdle": input.irr_hurdle,
            "growth_calibration": input.growth_calibration,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn summarize_or_none(mut values: Vec<f64>) -> Option<MetricSummary> {
    if values.is_empty() {
        None
    } else {
        aggregate::summarize(&mut values).ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
