//! Property tests for model and statistics invariants.
//!
//! Uses proptest to verify:
//! 1. Signal domain: every logic emits only -1 / 0 / +1 / missing, one per row
//! 2. Weighted composite: normalised weights sum to 1; indicator order is irrelevant
//! 3. Expanding z-score warm-up: missing before `min_periods` observations,
//!    defined once they exist

use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use regimelab_core::matrix::{monthly_index, IndicatorMatrix};
use regimelab_core::model::logic::WeightedComposite;
use regimelab_core::model::{LogicRegistry, ModelDefinition};
use regimelab_core::stats::expanding_zscore;

// ── Strategies (proptest) ────────────────────────────────────────────

/// A value that is missing about one time in ten.
fn arb_cell() -> impl Strategy<Value = f64> {
    prop_oneof![
        9 => (-5.0..5.0_f64),
        1 => Just(f64::NAN),
    ]
}

/// `k` columns of `rows` cells, named ind_0..ind_{k-1}.
fn arb_matrix() -> impl Strategy<Value = IndicatorMatrix> {
    (1usize..5, 10usize..60).prop_flat_map(|(k, rows)| {
        prop::collection::vec(prop::collection::vec(arb_cell(), rows), k).prop_map(move |cols| {
            let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
            IndicatorMatrix::new(
                monthly_index(start, rows),
                cols.into_iter()
                    .enumerate()
                    .map(|(i, c)| (format!("ind_{i}"), c))
                    .collect(),
            )
            .unwrap()
        })
    })
}

fn arb_direction() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), Just(-1.0)]
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

/// Parameters for `logic` over `names`, drawn from `seed` values.
fn parameters_for(logic: &str, names: &[String], seed: &[(f64, f64, f64)]) -> Map<String, Value> {
    let directions: Map<String, Value> = names
        .iter()
        .zip(seed)
        .map(|(n, (d, _, _))| (n.clone(), json!(d)))
        .collect();
    match logic {
        "threshold_rules" => {
            let thresholds: Map<String, Value> = names
                .iter()
                .zip(seed)
                .map(|(n, (_, a, b))| (n.clone(), json!({"bullish": a, "bearish": b})))
                .collect();
            params(json!({ "thresholds": thresholds }))
        }
        "weighted_composite" => {
            let weights: Map<String, Value> = names
                .iter()
                .zip(seed)
                .map(|(n, (_, a, _))| (n.clone(), json!(a.abs() + 0.1)))
                .collect();
            params(json!({
                "directions": directions,
                "weights": weights,
                "threshold_buy": 0.3,
                "threshold_sell": -0.3,
                "min_periods": 3
            }))
        }
        _ => params(json!({
            "directions": directions,
            "threshold_buy": 0.5,
            "threshold_sell": -0.5,
            "min_periods": 4
        })),
    }
}

// ── 1. Signal domain ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn signal_values_stay_in_domain(
        matrix in arb_matrix(),
        logic in prop_oneof![
            Just("zscore_composite"),
            Just("threshold_rules"),
            Just("weighted_composite"),
        ],
        seed in prop::collection::vec((arb_direction(), -3.0..3.0_f64, -3.0..3.0_f64), 4),
    ) {
        let names = matrix.column_names().to_vec();
        let definition = ModelDefinition::new(
            "prop_model",
            names.clone(),
            logic,
            parameters_for(logic, &names, &seed),
            "",
        )
        .unwrap();
        let model = LogicRegistry::builtin().build(definition).unwrap();
        let signal = model.generate_signal(&matrix).unwrap();

        prop_assert_eq!(signal.len(), matrix.len());
        prop_assert_eq!(signal.index(), matrix.index());
        for v in signal.as_i8().into_iter().flatten() {
            prop_assert!((-1..=1).contains(&v));
        }
    }
}

// ── 2. Weighted composite ────────────────────────────────────────────

proptest! {
    #[test]
    fn normalised_weights_sum_to_one(weights in prop::collection::vec(0.01..100.0_f64, 1..6)) {
        let names: Vec<String> = (0..weights.len()).map(|i| format!("w{i}")).collect();
        let directions: Map<String, Value> = names.iter().map(|n| (n.clone(), json!(1))).collect();
        let table: Map<String, Value> = names
            .iter()
            .zip(&weights)
            .map(|(n, w)| (n.clone(), json!(w)))
            .collect();
        let definition = ModelDefinition::new(
            "weights",
            names,
            WeightedComposite::TAG,
            params(json!({
                "directions": directions,
                "weights": table,
                "threshold_buy": 0.5,
                "threshold_sell": -0.5
            })),
            "",
        )
        .unwrap();
        let logic = WeightedComposite::from_definition(&definition).unwrap();
        let total: f64 = logic.normalized_weights().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn indicator_order_does_not_change_composite(
        matrix in arb_matrix(),
        seed in prop::collection::vec((arb_direction(), 0.1..3.0_f64, 0.0..1.0_f64), 4),
    ) {
        let names = matrix.column_names().to_vec();
        let mut reversed = names.clone();
        reversed.reverse();

        let forward = ModelDefinition::new(
            "fwd",
            names.clone(),
            WeightedComposite::TAG,
            parameters_for(WeightedComposite::TAG, &names, &seed),
            "",
        )
        .unwrap();
        // Same per-indicator parameters, declared in the opposite order.
        let backward = ModelDefinition::new(
            "bwd",
            reversed,
            WeightedComposite::TAG,
            forward.parameters().clone(),
            "",
        )
        .unwrap();

        let a = WeightedComposite::from_definition(&forward).unwrap().composite(&matrix).unwrap();
        let b = WeightedComposite::from_definition(&backward).unwrap().composite(&matrix).unwrap();
        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(x.is_nan(), y.is_nan());
            if !x.is_nan() {
                prop_assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
            }
        }
    }
}

// ── 3. Expanding z-score warm-up ─────────────────────────────────────

proptest! {
    #[test]
    fn zscore_defined_exactly_from_min_periods(
        values in prop::collection::vec(-100.0..100.0_f64, 12..40),
        min_periods in 2usize..10,
    ) {
        let z = expanding_zscore(&values, min_periods);
        prop_assert_eq!(z.len(), values.len());
        for v in &z[..min_periods - 1] {
            prop_assert!(v.is_nan());
        }
        // The first `min_periods` draws are distinct with probability one.
        prop_assert!(!z[min_periods - 1].is_nan());
    }
}
