//! End-to-end: config file on disk → matrix → models → signals → regimes.

use std::path::Path;

use proptest::prelude::*;
use serde_json::json;

use regimelab_core::data::{save_matrix, synthetic_matrix, SyntheticSpec};
use regimelab_core::model::ModelRequest;
use regimelab_runner::{export_regime_detail_csv, RegimelabConfig, Workspace, WorkspaceError};

// ── Helpers ──────────────────────────────────────────────────────────

fn write_project(dir: &Path, months: usize, seed: u64) -> RegimelabConfig {
    let matrix = synthetic_matrix(&SyntheticSpec::with_preset_columns(months, seed)).unwrap();
    save_matrix(&matrix, &dir.join("data/indicators.csv")).unwrap();

    let config_path = dir.join("regimelab.toml");
    std::fs::write(
        &config_path,
        r#"
[paths]
indicators = "data/indicators.csv"
metadata = "data/metadata.csv"
models_dir = "models"
regimes_dir = "out/regimes"

[regime.liquidity]
upper_threshold = 0.25
lower_threshold = -0.25
"#,
    )
    .unwrap();
    RegimelabConfig::from_file(&config_path).unwrap()
}

fn credit_request() -> ModelRequest {
    serde_json::from_value(json!({
        "name": "credit_tilt",
        "indicators": ["credit_hy_oas_zscore_24m", "vol_vix_zscore_24m"],
        "logic_type": "Weighted_Composite",
        "parameters": {
            "directions": {"credit_hy_oas_zscore_24m": -1, "vol_vix_zscore_24m": -1},
            "weights": {"credit_hy_oas_zscore_24m": 2.0, "vol_vix_zscore_24m": 1.0},
            "threshold_buy": 0.5,
            "threshold_sell": -0.5
        },
        "description": "lean against credit stress"
    }))
    .unwrap()
}

// ── Models ───────────────────────────────────────────────────────────

#[test]
fn create_save_run_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::new(write_project(dir.path(), 60, 11));

    let model = ws
        .create_model(credit_request(), true, true, Some("financial"))
        .unwrap();
    assert_eq!(model.logic_type(), "weighted_composite");
    assert!(dir.path().join("models/credit_tilt.json").is_file());

    let table = ws.run_models(&["credit_tilt".to_string()]).unwrap();
    let direct = model.generate_signal(ws.matrix().unwrap()).unwrap();
    assert_eq!(table.signal("credit_tilt"), Some(&direct));

    let out = dir.path().join("out/signals.csv");
    table.write_csv(&out).unwrap();
    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "date,credit_tilt");
    assert_eq!(lines.len(), 61);
    // Inside the 24-month warm-up every cell is empty.
    assert!(lines[1].ends_with(','));
}

#[test]
fn unknown_indicator_is_rejected_by_header_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::new(write_project(dir.path(), 30, 1));

    let mut request = credit_request();
    request.indicators.push("sent_unknown".into());
    let err = ws.create_model(request, true, false, None).unwrap_err();
    assert!(err.to_string().contains("sent_unknown"), "{err}");
}

#[test]
fn missing_model_names_what_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::new(write_project(dir.path(), 30, 1));
    ws.create_model(credit_request(), false, true, None).unwrap();

    let err = ws.run_models(&["nope".to_string()]).unwrap_err();
    assert!(matches!(err, WorkspaceError::Model(_)));
    assert!(err.to_string().contains("credit_tilt"), "{err}");
}

// ── Regimes ──────────────────────────────────────────────────────────

#[test]
fn config_overrides_change_regime_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), 72, 5);
    let mut tuned = Workspace::new(config);
    let mut plain = Workspace::new(RegimelabConfig {
        paths: tuned.config().paths.clone(),
        ..RegimelabConfig::default()
    });

    let a = tuned.get_regime("liquidity", false).unwrap();
    let b = plain.get_regime("liquidity", false).unwrap();
    assert_eq!(a.score.len(), b.score.len());
    for (x, y) in a.score.iter().zip(&b.score) {
        assert!(x == y || (x.is_nan() && y.is_nan()));
    }
    // A narrower band never produces more neutral months.
    let neutral = |f: &regimelab_core::RegimeFrame| f.regime.iter().filter(|r| **r == Some(0)).count();
    assert!(neutral(&a) <= neutral(&b));
}

#[test]
fn regime_detail_export_has_one_row_per_month() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::new(write_project(dir.path(), 36, 2));
    let frame = ws.get_regime("macro", false).unwrap();
    let csv = export_regime_detail_csv(&frame).unwrap();
    assert_eq!(csv.lines().count(), 37);
    assert!(csv.starts_with("date,regime_macro,label,score"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn saved_regimes_read_back_unchanged(seed in 0u64..1_000, months in 25usize..60) {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(write_project(dir.path(), months, seed));
        let table = ws.get_all_regimes(true).unwrap();

        for frame in &table.frames {
            let loaded = ws.regime_store().load(&frame.classifier).unwrap();
            prop_assert_eq!(loaded.len(), frame.len());
            for ((date, value), (want_date, want)) in
                loaded.iter().zip(frame.index.iter().zip(&frame.regime))
            {
                prop_assert_eq!(date, want_date);
                prop_assert_eq!(value, want);
            }
        }
    }
}
