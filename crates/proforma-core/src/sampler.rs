use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use crate::error::ProformaError;
use crate::types::AssumptionPeriod;
use crate::ProformaResult;

/// One draw from Normal(mean, std_dev).
///
/// A zero std dev is a degenerate distribution and returns the mean exactly;
/// statrs rejects sigma <= 0, so the case is handled before construction.
pub fn draw_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> ProformaResult<f64> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(ProformaError::InvalidAssumption {
            field: "std_dev".into(),
            reason: format!("must be finite and >= 0, got {std_dev}"),
        });
    }
    if std_dev == 0.0 {
        return Ok(mean);
    }
    let n = Normal::new(mean, std_dev).map_err(|e| ProformaError::InvalidAssumption {
        field: "distribution".into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })?;
    Ok(rng.sample(n))
}

/// One draw from a period's forecast distribution.
pub fn draw(rng: &mut StdRng, period: &AssumptionPeriod) -> ProformaResult<f64> {
    draw_normal(rng, period.mean, period.std_dev)
}

/// One exit-cap draw: the absolute value of the underlying normal draw.
///
/// A negative cap-rate draw is treated as a reflected positive rate rather
/// than rejected or resampled. Reflection thickens the right tail of the cap
/// distribution at the expense of the left.
pub fn draw_abs(rng: &mut StdRng, period: &AssumptionPeriod) -> ProformaResult<f64> {
    Ok(draw(rng, period)?.abs())
}

/// k independent draws from a period's forecast distribution.
pub fn draw_many(
    rng: &mut StdRng,
    period: &AssumptionPeriod,
    k: usize,
) -> ProformaResult<Vec<f64>> {
    let mut out = Vec::with_capacity(k);
    for _ in 0..k {
        out.push(draw(rng, period)?);
    }
    Ok(out)
}

/// k independent absolute-value draws (exit-cap policy).
pub fn draw_many_abs(
    rng: &mut StdRng,
    period: &AssumptionPeriod,
    k: usize,
) -> ProformaResult<Vec<f64>> {
    let mut out = Vec::with_capacity(k);
    for _ in 0..k {
        out.push(draw_abs(rng, period)?);
    }
    Ok(out)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Independent generator for one trial, derived from the master seed.
///
/// Each trial owns its stream, so draws do not depend on batch order or on
/// how trials are partitioned across workers: a fixed master seed gives
/// bit-identical results sequentially and in parallel.
pub fn trial_rng(master_seed: u64, trial: u64) -> StdRng {
    StdRng::seed_from_u64(splitmix64(master_seed ^ splitmix64(trial)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn period(mean: f64, std_dev: f64) -> AssumptionPeriod {
        AssumptionPeriod {
            year: 1,
            mean,
            std_dev,
        }
    }

    #[test]
    fn test_zero_std_dev_returns_mean_exactly() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let draws = draw_many(&mut rng, &period(0.065, 0.0), 100).unwrap();
        assert!(draws.iter().all(|&d| d == 0.065));
    }

    #[test]
    fn test_negative_std_dev_rejected() {
        let mut rng = StdRng::seed_from_u64(SEED);
        assert!(draw(&mut rng, &period(0.065, -0.01)).is_err());
    }

    #[test]
    fn test_abs_policy_never_negative() {
        // Mean below zero so the raw draws are mostly negative
        let mut rng = StdRng::seed_from_u64(SEED);
        let draws = draw_many_abs(&mut rng, &period(-0.05, 0.02), 1_000).unwrap();
        assert!(draws.iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn test_seeded_draws_reproducible() {
        let mut a = StdRng::seed_from_u64(SEED);
        let mut b = StdRng::seed_from_u64(SEED);
        let p = period(0.02, 0.01);
        assert_eq!(
            draw_many(&mut a, &p, 50).unwrap(),
            draw_many(&mut b, &p, 50).unwrap()
        );
    }

    #[test]
    fn test_sample_moments_converge() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let draws = draw_many(&mut rng, &period(100.0, 10.0), 50_000).unwrap();
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 100.0).abs() < 0.5, "mean={mean}");
        assert!((var.sqrt() - 10.0).abs() < 0.5, "std_dev={}", var.sqrt());
    }

    #[test]
    fn test_trial_streams_are_distinct() {
        let p = period(0.0, 1.0);
        let mut r0 = trial_rng(SEED, 0);
        let mut r1 = trial_rng(SEED, 1);
        assert_ne!(
            draw_many(&mut r0, &p, 10).unwrap(),
            draw_many(&mut r1, &p, 10).unwrap()
        );
    }

    #[test]
    fn test_trial_stream_independent_of_call_order() {
        let p = period(0.0, 1.0);
        let forward: Vec<f64> = (0..4)
            .map(|i| draw(&mut trial_rng(SEED, i), &p).unwrap())
            .collect();
        let mut reversed: Vec<f64> = (0..4)
            .rev()
            .map(|i| draw(&mut trial_rng(SEED, i), &p).unwrap())
            .collect();
        reversed.reverse();
        assert_eq!(forward, reversed);
    }
}
