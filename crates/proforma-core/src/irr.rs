use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::ProformaResult;

/// Lower edge of the rate domain. Discounting is undefined at -100%.
const RATE_FLOOR: f64 = -1.0;
/// Initial bracket, just above zero to a plain 100% rate.
const INITIAL_LO: f64 = 1e-6;
const INITIAL_HI: f64 = 1.0;
/// Each expansion quadruples the upper bound and halves the lower bound's
/// distance to the floor. 64 rounds reach ~3e38 before giving up.
const MAX_EXPANSIONS: u32 = 64;
const MAX_BISECTIONS: u32 = 256;
/// Bracket width at which the midpoint is accepted as the root. Keeps
/// reported IRRs stable well past four decimal digits.
const RATE_TOLERANCE: f64 = 1e-10;

/// Net Present Value of a series of cash flows at a periodic discount rate.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    let mut result = 0.0;
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        result += cf / discount;
    }

    result
}

/// Internal Rate of Return via bracketed bisection.
///
/// For an investment-then-returns vector NPV(r) decreases monotonically in r,
/// so once a sign change is bracketed bisection cannot miss the root. The
/// initial bracket sits near (0, 1]; when both endpoints agree in sign the
/// bracket grows geometrically: upward toward implausibly high nominal rates
/// for the windfall trials, downward toward -100% so losing trials resolve to
/// a negative rate instead of being discarded.
///
/// Fails with `InvalidCashFlow` for vectors shorter than two entries and
/// `NoRootFound` for degenerate vectors (no sign change, or NPV never
/// crossing zero within the expansion limit).
pub fn irr(cash_flows: &[f64]) -> ProformaResult<f64> {
    if cash_flows.len() < 2 {
        return Err(ProformaError::InvalidCashFlow(format!(
            "IRR requires at least 2 cash flows, got {}",
            cash_flows.len()
        )));
    }

    let has_negative = cash_flows.iter().any(|cf| *cf < 0.0);
    let has_positive = cash_flows.iter().any(|cf| *cf > 0.0);
    if !has_negative || !has_positive {
        return Err(ProformaError::NoRootFound {
            expansions: 0,
            lo: INITIAL_LO,
            hi: INITIAL_HI,
        });
    }

    let mut lo = INITIAL_LO;
    let mut hi = INITIAL_HI;
    let mut npv_lo = npv(lo, cash_flows);
    let mut npv_hi = npv(hi, cash_flows);
    let mut expansions = 0;

    while npv_lo.is_nan() || npv_hi.is_nan() || npv_lo * npv_hi > 0.0 {
        if npv_lo.is_nan() || npv_hi.is_nan() || expansions >= MAX_EXPANSIONS {
            return Err(ProformaError::NoRootFound { expansions, lo, hi });
        }
        hi *= 4.0;
        lo = RATE_FLOOR + (lo - RATE_FLOOR) / 2.0;
        npv_lo = npv(lo, cash_flows);
        npv_hi = npv(hi, cash_flows);
        expansions += 1;
    }

    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        let npv_mid = npv(mid, cash_flows);
        if npv_mid == 0.0 || (hi - lo) < RATE_TOLERANCE {
            return Ok(mid);
        }
        if (npv_mid < 0.0) == (npv_lo < 0.0) {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    Ok(0.5 * (lo + hi))
}

/// Input for a standalone IRR solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    pub cash_flows: Vec<f64>,
}

/// Output of a standalone IRR solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    pub irr: f64,
    /// Residual NPV at the returned root, for convergence inspection.
    pub npv_at_irr: f64,
}

/// Solve one cash-flow vector and wrap the result in the output envelope.
pub fn solve_irr(input: &IrrInput) -> ProformaResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();

    let rate = irr(&input.cash_flows)?;
    let output = IrrOutput {
        irr: rate,
        npv_at_irr: npv(rate, &input.cash_flows),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Bracketed-bisection IRR",
        &serde_json::json!({
            "num_cash_flows": input.cash_flows.len(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irr_one_year_round_trip() {
        // -100 now, 110 in a year: exactly 10%
        let rate = irr(&[-100.0, 110.0]).unwrap();
        assert!((rate - 0.10).abs() < 1e-6, "rate={rate}");
    }

    #[test]
    fn test_irr_even_cash_flows() {
        // -1000, +400 x3 => ~9.7%
        let rate = irr(&[-1000.0, 400.0, 400.0, 400.0]).unwrap();
        assert!((rate - 0.097).abs() < 0.01, "rate={rate}");
    }

    #[test]
    fn test_npv_zero_at_root() {
        let cfs = [-31_500_000.0, 1_200_000.0, 1_250_000.0, 33_000_000.0];
        let rate = irr(&cfs).unwrap();
        assert!(npv(rate, &cfs).abs() < 1.0, "residual={}", npv(rate, &cfs));
    }

    #[test]
    fn test_npv_known_answer() {
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ~ -21.04
        let result = npv(0.10, &[-1000.0, 300.0, 400.0, 500.0]);
        assert!((result - (-21.04)).abs() < 0.01, "npv={result}");
    }

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        assert_eq!(npv(0.0, &[-100.0, 50.0, 50.0, 50.0]), 50.0);
    }

    #[test]
    fn test_all_non_negative_fails_no_root() {
        let err = irr(&[100.0, 50.0, 50.0]).unwrap_err();
        assert!(matches!(err, ProformaError::NoRootFound { .. }));
    }

    #[test]
    fn test_all_negative_fails_no_root() {
        let err = irr(&[-100.0, -50.0]).unwrap_err();
        assert!(matches!(err, ProformaError::NoRootFound { .. }));
    }

    #[test]
    fn test_too_short_is_invalid_cash_flow() {
        let err = irr(&[-100.0]).unwrap_err();
        assert!(matches!(err, ProformaError::InvalidCashFlow(_)));
    }

    #[test]
    fn test_losing_trial_resolves_to_negative_rate() {
        // Recover 60 of 100: IRR must land below zero, not be excluded
        let rate = irr(&[-100.0, 20.0, 20.0, 20.0]).unwrap();
        assert!(rate < 0.0, "rate={rate}");
        assert!(npv(rate, &[-100.0, 20.0, 20.0, 20.0]).abs() < 1e-6);
    }

    #[test]
    fn test_windfall_trial_resolves_above_initial_bracket() {
        // -1 now, +100 in a year: 9900%, far beyond the initial upper bound
        let rate = irr(&[-1.0, 100.0]).unwrap();
        assert!((rate - 99.0).abs() < 1e-4, "rate={rate}");
    }

    #[test]
    fn test_infinite_sale_price_fails_cleanly() {
        let err = irr(&[-100.0, 10.0, f64::INFINITY]).unwrap_err();
        assert!(matches!(err, ProformaError::NoRootFound { .. }));
    }

    #[test]
    fn test_repeated_solves_are_stable() {
        let cfs = [-1000.0, 400.0, 400.0, 400.0];
        let a = irr(&cfs).unwrap();
        let b = irr(&cfs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_solve_irr_envelope() {
        let out = solve_irr(&IrrInput {
            cash_flows: vec![-100.0, 110.0],
        })
        .unwrap();
        assert!((out.result.irr - 0.10).abs() < 1e-6);
        assert!(out.result.npv_at_irr.abs() < 1e-6);
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }
}
