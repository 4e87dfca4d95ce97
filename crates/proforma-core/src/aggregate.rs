use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::ProformaError;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Percentile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Descriptive statistics for one simulated metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
}

/// One bucket of an empirical distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub probability: f64,
}

/// Probability mass below a caller-supplied threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdProbability {
    pub threshold: f64,
    pub probability: f64,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Descriptive statistics over a slice of values. The slice is sorted in place.
pub fn summarize(values: &mut [f64]) -> ProformaResult<MetricSummary> {
    if values.is_empty() {
        return Err(ProformaError::InvalidParameter {
            field: "values".into(),
            reason: "at least one value is required".into(),
        });
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(MetricSummary {
        mean,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        percentiles: Percentiles {
            p5: percentile_sorted(values, 5.0),
            p10: percentile_sorted(values, 10.0),
            p25: percentile_sorted(values, 25.0),
            p50: percentile_sorted(values, 50.0),
            p75: percentile_sorted(values, 75.0),
            p90: percentile_sorted(values, 90.0),
            p95: percentile_sorted(values, 95.0),
        },
    })
}

/// Bucket values into an empirical distribution with a caller-supplied width.
///
/// Buckets are keyed by `floor(value / width)`, so the result depends only on
/// the multiset of values, never on their order. Non-finite values are
/// dropped; probabilities are relative to the finite count.
pub fn empirical_distribution(
    values: &[f64],
    bucket_width: f64,
) -> ProformaResult<Vec<DistributionBucket>> {
    if !bucket_width.is_finite() || bucket_width <= 0.0 {
        return Err(ProformaError::InvalidParameter {
            field: "bucket_width".into(),
            reason: format!("must be a positive finite number, got {bucket_width}"),
        });
    }

    let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
    let mut total: u32 = 0;
    for &v in values {
        if !v.is_finite() {
            continue;
        }
        let idx = (v / bucket_width).floor() as i64;
        *counts.entry(idx).or_insert(0) += 1;
        total += 1;
    }

    let n = total.max(1) as f64;
    Ok(counts
        .into_iter()
        .map(|(idx, count)| DistributionBucket {
            lower: idx as f64 * bucket_width,
            upper: (idx + 1) as f64 * bucket_width,
            count,
            probability: count as f64 / n,
        })
        .collect())
}

/// Fraction of values strictly below the threshold. Empty input yields 0.
pub fn probability_below(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|&&v| v < threshold).count();
    below as f64 / values.len() as f64
}

// ---------------------------------------------------------------------------
// Public API: standalone distribution analysis
// ---------------------------------------------------------------------------

/// Input for a standalone distribution analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionInput {
    pub values: Vec<f64>,
    pub bucket_width: f64,
    /// Optional threshold for a probability-of-loss style query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Output of a standalone distribution analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionOutput {
    pub buckets: Vec<DistributionBucket>,
    pub summary: MetricSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below_threshold: Option<ThresholdProbability>,
}

/// Bucket and summarize a value set, with an optional threshold query.
pub fn analyze_distribution(
    input: &DistributionInput,
) -> ProformaResult<ComputationOutput<DistributionOutput>> {
    let start = Instant::now();

    let buckets = empirical_distribution(&input.values, input.bucket_width)?;
    let mut values = input.values.clone();
    let summary = summarize(&mut values)?;
    let below_threshold = input.threshold.map(|threshold| ThresholdProbability {
        threshold,
        probability: probability_below(&input.values, threshold),
    });

    let output = DistributionOutput {
        buckets,
        summary,
        below_threshold,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Empirical Distribution Analysis",
        &serde_json::json!({
            "num_values": input.values.len(),
            "bucket_width": input.bucket_width,
            "threshold": input.threshold,
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
