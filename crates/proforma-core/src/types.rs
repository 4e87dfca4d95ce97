use serde::{Deserialize, Serialize};

use crate::error::ProformaError;
use crate::ProformaResult;

/// One calendar year's forecast for a stochastic assumption:
/// a Normal(mean, std_dev) to be sampled per trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionPeriod {
    /// Semantic year index, 1-based from the acquisition date.
    pub year: u32,
    pub mean: f64,
    pub std_dev: f64,
}

impl AssumptionPeriod {
    /// Check the forecast is usable: finite mean, finite non-negative std dev.
    ///
    /// Naive confidence-interval arithmetic upstream can produce a negative
    /// std dev; it must be corrected before it reaches the simulation.
    pub fn validate(&self, field: &str) -> ProformaResult<()> {
        if !self.mean.is_finite() {
            return Err(ProformaError::InvalidAssumption {
                field: format!("{field} year {}", self.year),
                reason: format!("mean must be finite, got {}", self.mean),
            });
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(ProformaError::InvalidAssumption {
                field: format!("{field} year {}", self.year),
                reason: format!("std_dev must be finite and >= 0, got {}", self.std_dev),
            });
        }
        Ok(())
    }
}

/// Ordered per-year forecasts for one assumption, immutable once built.
///
/// Periods are addressed by semantic year index, never by positional row
/// offset, so mixed forecast frequencies upstream cannot misalign the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionSeries {
    pub periods: Vec<AssumptionPeriod>,
}

impl AssumptionSeries {
    pub fn new(periods: Vec<AssumptionPeriod>) -> Self {
        Self { periods }
    }

    /// Look up the forecast for a given year.
    pub fn period(&self, year: u32) -> ProformaResult<&AssumptionPeriod> {
        self.periods
            .iter()
            .find(|p| p.year == year)
            .ok_or_else(|| ProformaError::InvalidAssumption {
                field: "rent_growth".into(),
                reason: format!("no forecast period for year {year}"),
            })
    }

    /// The final forecast period, selected by highest year index.
    pub fn terminal(&self) -> ProformaResult<&AssumptionPeriod> {
        self.periods
            .iter()
            .max_by_key(|p| p.year)
            .ok_or_else(|| ProformaError::InvalidAssumption {
                field: "assumption_series".into(),
                reason: "series is empty".into(),
            })
    }

    /// Fail fast unless every year 1..=horizon has a valid forecast.
    pub fn validate_horizon(&self, field: &str, horizon: u32) -> ProformaResult<()> {
        for year in 1..=horizon {
            self.period(year)
                .map_err(|_| ProformaError::InvalidAssumption {
                    field: field.into(),
                    reason: format!("series covers {} periods but year {year} of {horizon} is missing", self.periods.len()),
                })?
                .validate(field)?;
        }
        Ok(())
    }
}

/// Optional multiplicative inflation of sampled rent growth: each year's
/// draw is scaled by an independent Normal(mean, std_dev) factor.
///
/// Strictly an opt-in calibration knob for widening a forecast's spread.
/// Never applied unless the input names it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthCalibration {
    pub mean: f64,
    pub std_dev: f64,
}

/// The ordered cash amounts for one trial: index 0 is the (negative) capital
/// outlay, the final entry includes sale proceeds.
pub type CashFlowVector = Vec<f64>;

/// Per-metric bucket widths for the output distribution tables.
///
/// Widths are caller-supplied because the metrics live on different scales:
/// 0.001 discretizes an IRR to three decimals while a sale price needs a
/// width in the hundreds of thousands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketWidths {
    pub irr: f64,
    pub roi: f64,
    pub sale_price: f64,
    pub terminal_noi: f64,
}

/// Parameters for a full simulation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Acquisition price, > 0.
    pub purchase_price: f64,
    /// In-place annual net operating income, > 0.
    pub current_noi: f64,
    /// Holding period in years.
    pub holding_years: u32,
    /// Number of Monte Carlo trials.
    pub num_trials: u32,
    /// Seed for reproducible runs. If absent, one is drawn from entropy and
    /// echoed back in the output assumptions.
    pub seed: Option<u64>,
    /// Cumulative-since-purchase rent growth forecast, one period per year.
    pub rent_growth: AssumptionSeries,
    /// Terminal exit capitalization rate forecast.
    pub exit_cap: AssumptionPeriod,
    /// IRR hurdle (e.g. financing cost) for the below-hurdle probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_hurdle: Option<f64>,
    /// When present, the output carries empirical distribution tables
    /// bucketed at these widths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_widths: Option<BucketWidths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_calibration: Option<GrowthCalibration>,
}

/// One fully simulated future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: u32,
    /// Sampled exit cap rate (absolute value of the underlying draw).
    pub exit_cap: f64,
    /// Sampled cumulative rent growth in the exit year.
    pub terminal_growth: f64,
    /// Projected NOI for years 1..=N.
    pub noi_path: Vec<f64>,
    /// Terminal NOI / exit cap.
    pub sale_price: f64,
    /// Undiscounted (total inflows - outlay) / outlay.
    pub roi: f64,
    /// None when the root search failed and the trial was excluded.
    pub irr: Option<f64>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
