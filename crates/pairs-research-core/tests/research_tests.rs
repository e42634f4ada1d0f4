use chrono::NaiveDate;
use pairs_research_core::backtest::backtest;
use pairs_research_core::cointegration::{
    engle_granger_test, estimate_hedge_ratio, find_cointegrated_pairs, RejectionReason,
    ScreenerConfig,
};
use pairs_research_core::pipeline::{run_research, ResearchConfig};
use pairs_research_core::signals::{
    compute_spread, compute_zscore, generate_signals, SignalThresholds,
};
use pairs_research_core::{PairsError, Position, PricePanel, TimeSeries};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
}

fn series(name: &str, values: Vec<Decimal>) -> TimeSeries {
    let n = values.len();
    TimeSeries::new(name, dates(n), values).unwrap()
}

fn to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap().round_dp(4)
}

fn random_walk(rng: &mut StdRng, n: usize, start: f64) -> Vec<f64> {
    let mut level = start;
    (0..n)
        .map(|_| {
            level += rng.gen_range(-1.0..1.0);
            level
        })
        .collect()
}

/// ES=F random walk, NQ=F = 2.5 * ES + 10 + small noise, YM=F independent walk.
fn futures_panel(seed: u64, n: usize) -> PricePanel {
    let mut rng = StdRng::seed_from_u64(seed);
    let es = random_walk(&mut rng, n, 4000.0);
    let nq: Vec<f64> = es
        .iter()
        .map(|v| 2.5 * v + 10.0 + rng.gen_range(-0.8..0.8))
        .collect();
    let ym = random_walk(&mut rng, n, 3400.0);
    let cols = [("ES=F", es), ("NQ=F", nq), ("YM=F", ym)];
    let series: Vec<TimeSeries> = cols
        .iter()
        .map(|(name, v)| series(name, v.iter().copied().map(to_dec).collect()))
        .collect();
    PricePanel::merge(&series).unwrap()
}

fn standard_thresholds() -> SignalThresholds {
    SignalThresholds::new(dec!(2.0), dec!(0.5)).unwrap()
}

// ===========================================================================
// End-to-end reference scenario
// ===========================================================================

#[test]
fn test_reference_scenario_with_long_window_is_flat() {
    let y = series("ES=F", vec![dec!(100), dec!(101), dec!(103), dec!(102), dec!(104)]);
    let x = series("NQ=F", vec![dec!(50), dec!(50.2), dec!(50.6), dec!(50.4), dec!(50.8)]);

    let spread = compute_spread(&y, &x, dec!(2.0)).unwrap();
    assert_eq!(
        spread.values(),
        &[dec!(0), dec!(0.6), dec!(1.8), dec!(1.2), dec!(2.4)]
    );

    let z = compute_zscore(&spread, 30).unwrap();
    assert_eq!(z.values(), &[None::<Decimal>; 5]);

    let signals = generate_signals(&z, &standard_thresholds()).unwrap();
    assert_eq!(signals.values(), &[Position::Flat; 5]);

    let pnl = backtest(&y, &x, dec!(2.0), &signals, dec!(0.0001)).unwrap();
    assert_eq!(pnl.values(), &[Decimal::ZERO; 4]);
}

#[test]
fn test_short_window_pipeline_trades() {
    // Spread oscillates around zero with occasional spikes
    let y_vals = [
        100.0, 100.5, 100.2, 100.4, 103.0, 100.3, 100.1, 100.6, 97.0, 100.2, 100.4, 100.1,
    ];
    let y = series("Y", y_vals.iter().copied().map(to_dec).collect());
    let x = series("X", vec![dec!(50); y_vals.len()]);
    let spread = compute_spread(&y, &x, dec!(2)).unwrap();
    let z = compute_zscore(&spread, 4).unwrap();
    let thresholds = SignalThresholds::new(dec!(1.4), dec!(0.3)).unwrap();
    let signals = generate_signals(&z, &thresholds).unwrap();

    // Spike up at t=4 shorts the spread, spike down at t=8 goes long
    assert_eq!(signals.values()[4], Position::Short);
    assert_eq!(signals.values()[8], Position::Long);

    let pnl = backtest(&y, &x, dec!(2), &signals, Decimal::ZERO).unwrap();
    // Short from 103.0 into 100.3 earns 2.7
    assert_eq!(pnl.values()[4], dec!(2.7));
    // Long from 97.0 into 100.2 earns 3.2
    assert_eq!(pnl.values()[8], dec!(3.2));
}

// ===========================================================================
// Screening
// ===========================================================================

#[test]
fn test_screen_finds_constructed_pair() {
    let panel = futures_panel(7, 300);
    let result = find_cointegrated_pairs(&panel, &ScreenerConfig::default()).unwrap();

    let labels: Vec<String> = result.summary.iter().map(|r| r.pair.clone()).collect();
    assert!(labels.contains(&"ES=F & NQ=F".to_string()));
    assert_eq!(result.summary.len(), result.pairs.len());
    assert_eq!(result.pairs.len() + result.rejected.len(), 3);
    for p in &result.pairs {
        assert!(p.p_value < dec!(0.05));
    }

    let es_nq = result
        .pairs
        .iter()
        .find(|p| p.label() == "ES=F & NQ=F")
        .unwrap();
    // ES regressed on NQ: slope is about 1 / 2.5
    assert!((es_nq.hedge_ratio - dec!(0.4)).abs() < dec!(0.01));
}

#[test]
fn test_identical_series_across_many_instruments() {
    let mut rng = StdRng::seed_from_u64(31);
    let base: Vec<Decimal> = random_walk(&mut rng, 120, 500.0)
        .into_iter()
        .map(to_dec)
        .collect();
    let cols: Vec<TimeSeries> = ["A", "B", "C", "D"]
        .iter()
        .map(|name| series(name, base.clone()))
        .collect();
    let panel = PricePanel::merge(&cols).unwrap();

    let result = find_cointegrated_pairs(&panel, &ScreenerConfig::default()).unwrap();
    assert!(result.pairs.is_empty());
    assert!(result.summary.is_empty());
    assert_eq!(result.rejected.len(), 6);
    assert!(result
        .rejected
        .iter()
        .all(|r| r.reason == RejectionReason::Collinear));
}

#[test]
fn test_engle_granger_on_independent_walks() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = series("A", random_walk(&mut rng, 250, 100.0).into_iter().map(to_dec).collect());
    let b = series("B", random_walk(&mut rng, 250, 100.0).into_iter().map(to_dec).collect());
    let eg = engle_granger_test(&a, &b, None).unwrap();
    assert!(!eg.collinear);
    assert!(eg.statistic.is_some());
    assert!(eg.p_value > Decimal::ZERO && eg.p_value <= Decimal::ONE);
    assert!(eg.critical_values.one_pct < eg.critical_values.five_pct);
    assert!(eg.critical_values.five_pct < eg.critical_values.ten_pct);
    assert_eq!(eg.hedge_ratio, estimate_hedge_ratio(&a, &b).unwrap());
}

#[test]
fn test_misaligned_inputs_are_errors() {
    let y = series("Y", vec![dec!(1), dec!(2), dec!(3)]);
    let x = TimeSeries::new("X", dates(4)[1..].to_vec(), vec![dec!(1), dec!(2), dec!(3)]).unwrap();
    match compute_spread(&y, &x, Decimal::ONE) {
        Err(PairsError::MisalignedSeries {
            left,
            right,
            left_len,
            right_len,
            ..
        }) => {
            assert_eq!((left.as_str(), right.as_str()), ("Y", "X"));
            assert_eq!((left_len, right_len), (3, 3));
        }
        other => panic!("expected misalignment, got {:?}", other),
    }
}

// ===========================================================================
// Research pipeline
// ===========================================================================

#[test]
fn test_run_research_envelope() {
    let panel = futures_panel(11, 260);
    let mut config = ResearchConfig::new(standard_thresholds());
    config.window = 20;

    let output = run_research(&panel, &config).unwrap();
    let report = &output.result;

    assert_eq!(report.analyses.len(), report.screening.pairs.len());
    assert!(!report.analyses.is_empty());
    for a in &report.analyses {
        assert_eq!(a.spread.len(), panel.len());
        assert_eq!(a.pnl.len(), panel.len() - 1);
        assert_eq!(a.spread_table.len(), panel.len());
        assert!(a.zscore.values()[..19].iter().all(Option::is_none));
        assert_eq!(a.summary.total_pnl, a.pnl.values().iter().copied().sum::<Decimal>());
    }
    assert_eq!(output.warnings.len(), report.screening.rejected.len());
    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    assert_eq!(output.assumptions["window"], 20);
}

#[test]
fn test_run_research_rejects_invalid_config() {
    let panel = futures_panel(3, 60);
    let mut config = ResearchConfig::new(standard_thresholds());
    config.significance = Decimal::ZERO;
    assert!(matches!(
        run_research(&panel, &config),
        Err(PairsError::InvalidInput { .. })
    ));
}
