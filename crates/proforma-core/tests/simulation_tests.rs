use proforma_core::aggregate::{empirical_distribution, probability_below, summarize};
use proforma_core::simulation::run_simulation;
use proforma_core::types::{AssumptionPeriod, AssumptionSeries, BucketWidths, SimulationInput};

const SEED: u64 = 42;

fn baseline_input(num_trials: u32, seed: Option<u64>) -> SimulationInput {
    // 31.5M acquisition at a 3.81% entry cap, ten-year hold
    SimulationInput {
        purchase_price: 31_500_000.0,
        current_noi: 1_200_000.0,
        holding_years: 10,
        num_trials,
        seed,
        rent_growth: AssumptionSeries::new(
            (1..=10)
                .map(|year| AssumptionPeriod {
                    year,
                    mean: 0.025 * year as f64,
                    std_dev: 0.01 + 0.002 * year as f64,
                })
                .collect(),
        ),
        exit_cap: AssumptionPeriod {
            year: 10,
            mean: 0.05,
            std_dev: 0.006,
        },
        irr_hurdle: Some(0.055),
        bucket_widths: None,
        growth_calibration: None,
    }
}

// ===========================================================================
// Full-batch behavior
// ===========================================================================

#[test]
fn test_baseline_run_produces_distribution() {
    let out = run_simulation(&baseline_input(2_000, Some(SEED))).unwrap();
    let result = &out.result;

    assert_eq!(result.completed_trials, 2_000);
    assert_eq!(result.trials.len(), 2_000);
    assert!(result.excluded_trials < 100);

    let irr = result.summary.irr.as_ref().unwrap();
    assert!(irr.percentiles.p5 < irr.percentiles.p95);
    assert!(irr.std_dev > 0.0);

    let loss = result.summary.probability_of_loss.as_ref().unwrap();
    assert!((0.0..=1.0).contains(&loss.probability));
    let hurdle = result.summary.irr_below_hurdle.as_ref().unwrap();
    assert_eq!(hurdle.threshold, 0.055);
}

#[test]
fn test_fixed_seed_runs_are_bit_identical() {
    let input = baseline_input(500, Some(SEED));
    let a = run_simulation(&input).unwrap();
    let b = run_simulation(&input).unwrap();

    let sa = a.result.summary.irr.as_ref().unwrap();
    let sb = b.result.summary.irr.as_ref().unwrap();
    assert_eq!(sa.mean, sb.mean);
    assert_eq!(sa.percentiles.p50, sb.percentiles.p50);

    for (x, y) in a.result.trials.iter().zip(&b.result.trials) {
        assert_eq!(x.exit_cap, y.exit_cap);
        assert_eq!(x.terminal_growth, y.terminal_growth);
        assert_eq!(x.sale_price, y.sale_price);
        assert_eq!(x.irr, y.irr);
    }
}

#[test]
fn test_scale_run_stable_across_seeds() {
    // 10k trials: the distribution's location should not move materially
    // with the seed, only its sampling noise
    let a = run_simulation(&baseline_input(10_000, Some(1))).unwrap();
    let b = run_simulation(&baseline_input(10_000, Some(2))).unwrap();

    let ia = a.result.summary.irr.as_ref().unwrap();
    let ib = b.result.summary.irr.as_ref().unwrap();
    assert!(
        (ia.mean - ib.mean).abs() < 0.005,
        "mean IRR drifted: {} vs {}",
        ia.mean,
        ib.mean
    );

    let pa = a.result.summary.sale_price.as_ref().unwrap();
    let pb = b.result.summary.sale_price.as_ref().unwrap();
    let drift = (pa.percentiles.p50 - pb.percentiles.p50).abs() / pa.percentiles.p50;
    assert!(drift < 0.03, "median sale price drifted {drift}");
}

#[test]
fn test_exit_caps_all_non_negative() {
    // Mean cap near zero so raw draws frequently go negative
    let mut input = baseline_input(2_000, Some(SEED));
    input.exit_cap = AssumptionPeriod {
        year: 10,
        mean: 0.002,
        std_dev: 0.01,
    };
    let out = run_simulation(&input).unwrap();
    assert!(out.result.trials.iter().all(|t| t.exit_cap >= 0.0));
}

// ===========================================================================
// Aggregation over trial output
// ===========================================================================

#[test]
fn test_trial_order_does_not_change_aggregates() {
    let out = run_simulation(&baseline_input(1_000, Some(SEED))).unwrap();
    let irrs: Vec<f64> = out.result.trials.iter().filter_map(|t| t.irr).collect();

    let mut shuffled = irrs.clone();
    shuffled.reverse();
    shuffled.rotate_left(311);

    let a = summarize(&mut irrs.clone()).unwrap();
    let b = summarize(&mut shuffled.clone()).unwrap();
    assert_eq!(a.mean, b.mean);
    assert_eq!(a.std_dev, b.std_dev);
    assert_eq!(a.percentiles.p5, b.percentiles.p5);
    assert_eq!(a.percentiles.p95, b.percentiles.p95);

    let da = empirical_distribution(&irrs, 0.001).unwrap();
    let db = empirical_distribution(&shuffled, 0.001).unwrap();
    assert_eq!(da.len(), db.len());
    for (x, y) in da.iter().zip(&db) {
        assert_eq!(x.lower, y.lower);
        assert_eq!(x.count, y.count);
        assert_eq!(x.probability, y.probability);
    }
}

#[test]
fn test_distribution_tables_on_request() {
    let mut input = baseline_input(1_000, Some(SEED));
    input.bucket_widths = Some(BucketWidths {
        irr: 0.001,
        roi: 0.01,
        sale_price: 500_000.0,
        terminal_noi: 50_000.0,
    });
    let out = run_simulation(&input).unwrap();
    let dist = out.result.distributions.as_ref().unwrap();

    let irr_mass: f64 = dist.irr.iter().map(|b| b.probability).sum();
    assert!((irr_mass - 1.0).abs() < 1e-9);
    for b in &dist.sale_price {
        assert!((b.upper - b.lower - 500_000.0).abs() < 1e-6);
    }
    let counted: u32 = dist.roi.iter().map(|b| b.count).sum();
    assert_eq!(counted, out.result.completed_trials);

    let without = run_simulation(&baseline_input(100, Some(SEED))).unwrap();
    assert!(without.result.distributions.is_none());
}

#[test]
fn test_loss_probability_matches_manual_count() {
    let out = run_simulation(&baseline_input(1_000, Some(SEED))).unwrap();
    let rois: Vec<f64> = out.result.trials.iter().map(|t| t.roi).collect();
    let manual = rois.iter().filter(|&&r| r < 0.0).count() as f64 / rois.len() as f64;
    assert_eq!(
        out.result
            .summary
            .probability_of_loss
            .as_ref()
            .unwrap()
            .probability,
        manual
    );
    assert_eq!(probability_below(&rois, 0.0), manual);
}

#[test]
fn test_per_trial_table_is_complete() {
    let out = run_simulation(&baseline_input(250, Some(SEED))).unwrap();
    for (i, t) in out.result.trials.iter().enumerate() {
        assert_eq!(t.trial as usize, i);
        assert_eq!(t.noi_path.len(), 10);
        assert!(t.exit_cap >= 0.0);
        assert!(t.roi.is_finite());
    }
}
