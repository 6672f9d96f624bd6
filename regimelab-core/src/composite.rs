//! Composite z-score: the one aggregation shared by decision logics and
//! regime presets.
//!
//! Each input series is turned into an expanding z-score, multiplied by its
//! direction (so positive always means "favourable"), then aggregated per row:
//!
//! - `Aggregation::Mean`: mean of the directed z-scores available on that row.
//! - `Aggregation::WeightedSum`: sum of `z * direction * w` over the available
//!   terms, with weights normalised to sum to 1 across all terms.
//!
//! A row where every term is missing has a missing composite. Rows where only
//! some terms are missing aggregate the terms that are present.

use serde::{Deserialize, Serialize};

use crate::stats::expanding_zscore;

/// Orientation of an indicator: does a high value mean favourable conditions?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// High value is favourable (+1).
    Positive,
    /// High value is adverse (-1).
    Negative,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    /// Parse a persisted `+1` / `-1`. Any other value is rejected.
    pub fn from_sign(value: f64) -> Option<Self> {
        if value == 1.0 {
            Some(Self::Positive)
        } else if value == -1.0 {
            Some(Self::Negative)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    WeightedSum,
}

/// One input to the composite.
#[derive(Debug, Clone, Copy)]
pub struct Term<'a> {
    pub values: &'a [f64],
    pub direction: Direction,
    /// Raw (unnormalised) weight. Ignored by `Aggregation::Mean`.
    pub weight: f64,
}

impl<'a> Term<'a> {
    pub fn new(values: &'a [f64], direction: Direction) -> Self {
        Self {
            values,
            direction,
            weight: 1.0,
        }
    }

    pub fn weighted(values: &'a [f64], direction: Direction, weight: f64) -> Self {
        Self {
            values,
            direction,
            weight,
        }
    }
}

/// Scale weights so they sum to 1.
///
/// `None` when any weight is not finite or they sum to zero. Weights whose
/// sum overflows are first rescaled by the largest magnitude.
pub fn normalize_weights(weights: &[f64]) -> Option<Vec<f64>> {
    if weights.iter().any(|w| !w.is_finite()) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total.is_finite() {
        if total == 0.0 {
            return None;
        }
        return Some(weights.iter().map(|w| w / total).collect());
    }

    let scale = weights.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
    let scaled: Vec<f64> = weights.iter().map(|w| w / scale).collect();
    let total: f64 = scaled.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return None;
    }
    Some(scaled.into_iter().map(|w| w / total).collect())
}

/// Directed expanding z-score for one series.
pub fn directed_zscore(values: &[f64], direction: Direction, min_periods: usize) -> Vec<f64> {
    let sign = direction.sign();
    expanding_zscore(values, min_periods)
        .into_iter()
        .map(|z| z * sign)
        .collect()
}

/// Per-row composite score over `rows` rows. Every term must have `rows` values.
pub fn composite_score(
    terms: &[Term<'_>],
    rows: usize,
    min_periods: usize,
    aggregation: Aggregation,
) -> Vec<f64> {
    let directed: Vec<Vec<f64>> = terms
        .iter()
        .map(|t| directed_zscore(t.values, t.direction, min_periods))
        .collect();

    let weights = match aggregation {
        Aggregation::Mean => vec![1.0; terms.len()],
        Aggregation::WeightedSum => {
            let raw: Vec<f64> = terms.iter().map(|t| t.weight).collect();
            match normalize_weights(&raw) {
                Some(w) => w,
                None => return vec![f64::NAN; rows],
            }
        }
    };

    (0..rows)
        .map(|row| {
            let mut total = 0.0;
            let mut present = 0usize;
            for (z, w) in directed.iter().zip(&weights) {
                let value = z[row];
                if value.is_nan() {
                    continue;
                }
                total += value * w;
                present += 1;
            }
            match (present, aggregation) {
                (0, _) => f64::NAN,
                (n, Aggregation::Mean) => total / n as f64,
                (_, Aggregation::WeightedSum) => total,
            }
        })
        .collect()
}

/// Cut-offs turning a composite score into -1 / 0 / +1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Scores strictly above this are +1.
    pub upper: f64,
    /// Scores strictly below this are -1.
    pub lower: f64,
}

impl Thresholds {
    pub fn new(upper: f64, lower: f64) -> Self {
        Self { upper, lower }
    }

    /// Symmetric ±`width` band around zero.
    pub fn symmetric(width: f64) -> Self {
        Self::new(width, -width)
    }

    pub fn classify(&self, score: f64) -> Option<i8> {
        if score.is_nan() {
            None
        } else if score > self.upper {
            Some(1)
        } else if score < self.lower {
            Some(-1)
        } else {
            Some(0)
        }
    }

    pub fn discretize(&self, scores: &[f64]) -> Vec<Option<i8>> {
        scores.iter().map(|&s| self.classify(s)).collect()
    }
}
