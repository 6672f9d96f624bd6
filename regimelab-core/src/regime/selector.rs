//! Regime selector: name → classifier, plus the all-regimes diagnostic table.

use chrono::NaiveDate;
use tracing::{error, info};

use crate::matrix::IndicatorMatrix;

use super::classifier::RegimeClassifier;
use super::preset::RegimePreset;
use super::{RegimeError, RegimeFrame};

/// Classifiers in registration order.
#[derive(Debug, Default)]
pub struct RegimeSelector {
    classifiers: Vec<Box<dyn RegimeClassifier>>,
}

impl RegimeSelector {
    pub fn empty() -> Self {
        Self::default()
    }

    /// macro, financial, liquidity with default parameters.
    pub fn builtin() -> Self {
        Self::from_presets(RegimePreset::builtin())
    }

    pub fn from_presets(presets: Vec<RegimePreset>) -> Self {
        let mut selector = Self::empty();
        for preset in presets {
            selector.register(Box::new(preset));
        }
        selector
    }

    /// Add a classifier, replacing any with the same name in place.
    pub fn register(&mut self, classifier: Box<dyn RegimeClassifier>) {
        let name = normalize_name(classifier.name());
        match self
            .classifiers
            .iter()
            .position(|c| normalize_name(c.name()) == name)
        {
            Some(pos) => self.classifiers[pos] = classifier,
            None => self.classifiers.push(classifier),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.classifiers.iter().map(|c| c.name().to_string()).collect()
    }

    /// `(name, description)` for every classifier.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.classifiers
            .iter()
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<&dyn RegimeClassifier, RegimeError> {
        let wanted = normalize_name(name);
        self.classifiers
            .iter()
            .find(|c| normalize_name(c.name()) == wanted)
            .map(|c| c.as_ref())
            .ok_or_else(|| RegimeError::UnknownClassifier {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Classify `matrix` with the named classifier (trimmed, case-insensitive).
    pub fn get_regime(&self, name: &str, matrix: &IndicatorMatrix) -> Result<RegimeFrame, RegimeError> {
        let classifier = self.get(name)?;
        info!(regime = classifier.name(), "running regime classifier");
        classify_checked(classifier, matrix)
    }

    /// Run every classifier. Failures are logged and reported, not fatal.
    pub fn get_all_regimes(&self, matrix: &IndicatorMatrix) -> RegimeTable {
        let mut frames = Vec::new();
        let mut failures = Vec::new();
        for classifier in &self.classifiers {
            match classify_checked(classifier.as_ref(), matrix) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    error!(regime = classifier.name(), error = %e, "regime classifier failed");
                    failures.push((classifier.name().to_string(), e));
                }
            }
        }

        let table = RegimeTable::new(matrix.index().to_vec(), frames, failures);
        for a in &table.agreement {
            info!(
                left = %a.left,
                right = %a.right,
                rate = a.rate,
                months = a.rows,
                "regime agreement"
            );
        }
        table
    }
}

/// Run `classifier` and reject a frame that is not aligned to `matrix` or
/// carries values outside {-1, 0, 1}.
fn classify_checked(
    classifier: &dyn RegimeClassifier,
    matrix: &IndicatorMatrix,
) -> Result<RegimeFrame, RegimeError> {
    let frame = classifier.classify(matrix)?;
    frame.validate(matrix.index())?;
    Ok(frame)
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Share of months on which two classifiers give the same regime.
#[derive(Debug, Clone, PartialEq)]
pub struct Agreement {
    pub left: String,
    pub right: String,
    pub rate: f64,
    /// Months compared: those where every included classifier is defined.
    pub rows: usize,
}

/// Every classifier's output side by side. Diagnostic only.
#[derive(Debug)]
pub struct RegimeTable {
    pub index: Vec<NaiveDate>,
    pub frames: Vec<RegimeFrame>,
    pub failures: Vec<(String, RegimeError)>,
    pub agreement: Vec<Agreement>,
}

impl RegimeTable {
    pub fn new(
        index: Vec<NaiveDate>,
        frames: Vec<RegimeFrame>,
        failures: Vec<(String, RegimeError)>,
    ) -> Self {
        let agreement = pairwise_agreement(&frames);
        Self {
            index,
            frames,
            failures,
            agreement,
        }
    }

    pub fn frame(&self, classifier: &str) -> Option<&RegimeFrame> {
        self.frames.iter().find(|f| f.classifier == classifier)
    }

    /// Rows where every included classifier has a regime.
    pub fn complete_rows(&self) -> Vec<usize> {
        complete_rows(&self.frames, self.index.len())
    }
}

fn complete_rows(frames: &[RegimeFrame], rows: usize) -> Vec<usize> {
    if frames.is_empty() {
        return Vec::new();
    }
    (0..rows)
        .filter(|&row| frames.iter().all(|f| f.regime.get(row).copied().flatten().is_some()))
        .collect()
}

fn pairwise_agreement(frames: &[RegimeFrame]) -> Vec<Agreement> {
    let rows = frames.first().map(|f| f.len()).unwrap_or(0);
    let complete = complete_rows(frames, rows);
    if frames.len() < 2 || complete.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for (i, left) in frames.iter().enumerate() {
        for right in &frames[i + 1..] {
            let same = complete
                .iter()
                .filter(|&&row| left.regime[row] == right.regime[row])
                .count();
            out.push(Agreement {
                left: left.classifier.clone(),
                right: right.classifier.clone(),
                rate: same as f64 / complete.len() as f64,
                rows: complete.len(),
            });
        }
    }
    out
}
