//! Regime classification: fixed composite-z-score presets over the indicator
//! matrix, a name-keyed selector, and CSV persistence of the results.

pub mod classifier;
pub mod preset;
pub mod selector;
pub mod store;

pub use classifier::RegimeClassifier;
pub use preset::RegimePreset;
pub use selector::{Agreement, RegimeSelector, RegimeTable};
pub use store::RegimeStore;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RegimeError {
    #[error("unknown regime classifier '{name}' (available: {})", .available.join(", "))]
    UnknownClassifier { name: String, available: Vec<String> },

    #[error("regime '{classifier}': none of its indicators are in the matrix (requires: {})", .required.join(", "))]
    NoIndicatorsAvailable {
        classifier: String,
        required: Vec<String>,
    },

    #[error("regime '{classifier}' produced an invalid frame: {reason}")]
    InvalidOutput { classifier: String, reason: String },

    #[error("regime store I/O at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("regime CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("regime file {}: row {row}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

/// Human-readable names for +1 / 0 / -1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeLabels {
    pub favorable: String,
    pub neutral: String,
    pub adverse: String,
}

impl RegimeLabels {
    pub fn new(favorable: &str, neutral: &str, adverse: &str) -> Self {
        Self {
            favorable: favorable.to_string(),
            neutral: neutral.to_string(),
            adverse: adverse.to_string(),
        }
    }

    pub fn label(&self, regime: i8) -> &str {
        match regime.signum() {
            1 => &self.favorable,
            -1 => &self.adverse,
            _ => &self.neutral,
        }
    }
}

/// One classifier's output over a matrix index.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeFrame {
    pub classifier: String,
    pub index: Vec<NaiveDate>,
    /// -1 / 0 / +1, `None` while the composite is undefined.
    pub regime: Vec<Option<i8>>,
    /// Composite score behind each regime value (NaN when undefined).
    pub score: Vec<f64>,
    pub labels: RegimeLabels,
    pub used_indicators: Vec<String>,
    pub missing_indicators: Vec<String>,
    /// Ex-post comparison column copied from the matrix; never an input.
    pub validation: Option<(String, Vec<f64>)>,
}

impl RegimeFrame {
    /// Column name used in persisted files: `regime_<classifier>`.
    pub fn column_name(&self) -> String {
        regime_column(&self.classifier)
    }

    pub fn len(&self) -> usize {
        self.regime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regime.is_empty()
    }

    pub fn label_at(&self, row: usize) -> Option<&str> {
        self.regime
            .get(row)
            .copied()
            .flatten()
            .map(|r| self.labels.label(r))
    }

    pub fn valid_count(&self) -> usize {
        self.regime.iter().filter(|r| r.is_some()).count()
    }

    /// Check the frame is aligned to `index` and every regime is -1, 0 or +1.
    pub fn validate(&self, index: &[NaiveDate]) -> Result<(), RegimeError> {
        let invalid = |reason: String| RegimeError::InvalidOutput {
            classifier: self.classifier.clone(),
            reason,
        };
        if self.index.as_slice() != index {
            return Err(invalid(format!(
                "index has {} rows, expected the {}-row matrix index",
                self.index.len(),
                index.len()
            )));
        }
        let rows = index.len();
        if self.regime.len() != rows || self.score.len() != rows {
            return Err(invalid(format!(
                "{} regime and {} score rows for a {rows}-row index",
                self.regime.len(),
                self.score.len()
            )));
        }
        if let Some((name, values)) = &self.validation {
            if values.len() != rows {
                return Err(invalid(format!(
                    "validation column '{name}' has {} rows, expected {rows}",
                    values.len()
                )));
            }
        }
        let out_of_domain: Vec<String> = self
            .regime
            .iter()
            .zip(index)
            .filter_map(|(r, date)| match r {
                Some(v) if !(-1..=1).contains(v) => Some(format!("{date}={v}")),
                _ => None,
            })
            .collect();
        if !out_of_domain.is_empty() {
            return Err(invalid(format!(
                "values outside {{-1, 0, 1}}: {}",
                out_of_domain.join(", ")
            )));
        }
        Ok(())
    }

    /// Months per regime value.
    pub fn counts(&self) -> BTreeMap<i8, usize> {
        let mut counts = BTreeMap::new();
        for r in self.regime.iter().flatten() {
            *counts.entry(*r).or_insert(0) += 1;
        }
        counts
    }
}

pub fn regime_column(classifier: &str) -> String {
    format!("regime_{classifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_by_sign() {
        let labels = RegimeLabels::new("risk_on", "neutral", "risk_off");
        assert_eq!(labels.label(1), "risk_on");
        assert_eq!(labels.label(0), "neutral");
        assert_eq!(labels.label(-1), "risk_off");
    }

    #[test]
    fn frame_helpers() {
        let frame = RegimeFrame {
            classifier: "macro".into(),
            index: crate::matrix::monthly_index(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 3),
            regime: vec![None, Some(1), Some(1)],
            score: vec![f64::NAN, 0.9, 0.7],
            labels: RegimeLabels::new("expansion", "neutral", "contraction"),
            used_indicators: vec![],
            missing_indicators: vec![],
            validation: None,
        };
        assert_eq!(frame.column_name(), "regime_macro");
        assert_eq!(frame.label_at(0), None);
        assert_eq!(frame.label_at(1), Some("expansion"));
        assert_eq!(frame.valid_count(), 2);
        assert_eq!(frame.counts().get(&1), Some(&2));
    }

    fn liquidity_frame() -> RegimeFrame {
        RegimeFrame {
            classifier: "liquidity".into(),
            index: crate::matrix::monthly_index(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 3),
            regime: vec![None, Some(0), Some(-1)],
            score: vec![f64::NAN, 0.1, -0.9],
            labels: RegimeLabels::new("accommodative", "neutral", "restrictive"),
            used_indicators: vec![],
            missing_indicators: vec![],
            validation: None,
        }
    }

    #[test]
    fn validate_accepts_aligned_frame() {
        let frame = liquidity_frame();
        assert!(frame.validate(&frame.index).is_ok());
    }

    #[test]
    fn validate_rejects_short_or_misaligned_frame() {
        let frame = liquidity_frame();
        let longer = crate::matrix::monthly_index(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 4);
        assert!(matches!(
            frame.validate(&longer),
            Err(RegimeError::InvalidOutput { .. })
        ));

        let mut short = liquidity_frame();
        short.regime.pop();
        assert!(short.validate(&frame.index).is_err());

        let mut bad_validation = liquidity_frame();
        bad_validation.validation = Some(("cycle_nber_recession".into(), vec![0.0]));
        assert!(bad_validation.validate(&frame.index).is_err());
    }

    #[test]
    fn validate_rejects_out_of_domain_regime() {
        let mut frame = liquidity_frame();
        frame.regime[1] = Some(7);
        let err = frame.validate(&frame.index).unwrap_err();
        assert!(err.to_string().contains("2020-02-01=7"), "{err}");
    }
}
