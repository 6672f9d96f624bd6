//! Decision logics: the strategy half of a model.
//!
//! A logic is built from a validated `ModelDefinition` (its constructor checks
//! the parameter keys it needs) and computes a raw `-1/0/+1` series from the
//! indicator subset the model declared. Logics never validate their own
//! output; `DecisionModel::generate_signal` does that for every logic alike.

pub mod threshold;
pub mod weighted;
pub mod zscore;

pub use threshold::{ThresholdBand, ThresholdRules};
pub use weighted::WeightedComposite;
pub use zscore::ZScoreComposite;

use serde_json::Value;

use super::definition::{ModelDefinition, Parameters};
use super::error::ModelError;
use crate::composite::{Direction, Thresholds};
use crate::matrix::IndicatorMatrix;

/// Default expanding-window warm-up, in rows.
pub const DEFAULT_MIN_PERIODS: usize = 24;

/// Signal computation strategy.
pub trait SignalLogic: Send + Sync + std::fmt::Debug {
    /// Registry tag (e.g. "zscore_composite").
    fn logic_type(&self) -> &'static str;

    /// Compute a raw signal over `subset`, which holds exactly the model's
    /// declared indicators in declaration order.
    ///
    /// Must return one entry per row. Must only use rows `0..=t` for row `t`.
    fn compute(&self, subset: &IndicatorMatrix) -> Result<Vec<Option<i8>>, ModelError>;
}

/// Typed access to a definition's parameter map with errors that name the key.
pub(crate) struct ParamReader<'a> {
    model: &'a str,
    params: &'a Parameters,
}

impl<'a> ParamReader<'a> {
    pub fn new(definition: &'a ModelDefinition) -> Self {
        Self {
            model: definition.name(),
            params: definition.parameters(),
        }
    }

    pub fn invalid(&self, reason: impl Into<String>) -> ModelError {
        ModelError::invalid(self.model, reason)
    }

    /// Fail on the first key in `keys` that is absent.
    pub fn require_keys(&self, logic: &str, keys: &[&str]) -> Result<(), ModelError> {
        for key in keys {
            if !self.params.contains_key(*key) {
                return Err(self.invalid(format!(
                    "missing required parameter '{key}' ({logic} requires: {})",
                    keys.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn value(&self, key: &str) -> Result<&'a Value, ModelError> {
        self.params
            .get(key)
            .ok_or_else(|| self.invalid(format!("missing required parameter '{key}'")))
    }

    pub fn number(&self, key: &str) -> Result<f64, ModelError> {
        let v = self.value(key)?;
        match v.as_f64() {
            Some(x) if x.is_finite() => Ok(x),
            _ => Err(self.invalid(format!("parameter '{key}' must be a finite number, got {v}"))),
        }
    }

    pub fn object(&self, key: &str) -> Result<&'a Parameters, ModelError> {
        let v = self.value(key)?;
        v.as_object()
            .ok_or_else(|| self.invalid(format!("parameter '{key}' must be an object")))
    }

    /// Optional positive integer (accepts `24` or `24.0`).
    pub fn min_periods(&self) -> Result<usize, ModelError> {
        let Some(v) = self.params.get("min_periods") else {
            return Ok(DEFAULT_MIN_PERIODS);
        };
        match v.as_f64() {
            Some(x) if x >= 1.0 && x.fract() == 0.0 && x.is_finite() => Ok(x as usize),
            _ => Err(self.invalid(format!(
                "parameter 'min_periods' must be a positive integer, got {v}"
            ))),
        }
    }

    /// `threshold_buy` / `threshold_sell` as discretisation cut-offs.
    pub fn thresholds(&self) -> Result<Thresholds, ModelError> {
        let buy = self.number("threshold_buy")?;
        let sell = self.number("threshold_sell")?;
        if sell > buy {
            return Err(self.invalid(format!(
                "threshold_sell ({sell}) must not exceed threshold_buy ({buy})"
            )));
        }
        Ok(Thresholds::new(buy, sell))
    }

    /// One direction per indicator, in indicator order.
    pub fn directions(&self, indicators: &[String]) -> Result<Vec<Direction>, ModelError> {
        let table = self.object("directions")?;
        indicators
            .iter()
            .map(|ind| {
                let v = table.get(ind).ok_or_else(|| {
                    self.invalid(format!(
                        "indicator '{ind}' has no entry in parameters['directions']"
                    ))
                })?;
                v.as_f64().and_then(Direction::from_sign).ok_or_else(|| {
                    self.invalid(format!("direction for '{ind}' must be +1 or -1, got {v}"))
                })
            })
            .collect()
    }
}
