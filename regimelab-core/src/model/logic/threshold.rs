//! `threshold_rules`: majority vote over per-indicator threshold bands.

use serde::{Deserialize, Serialize};

use crate::matrix::IndicatorMatrix;
use crate::model::definition::ModelDefinition;
use crate::model::error::ModelError;

use super::{ParamReader, SignalLogic};

/// Per-indicator cut-offs for a threshold vote.
///
/// `bullish > bearish` is the normal orientation (high is good). Anything else
/// is inverted (low is good, e.g. volatility): bullish when the value is below
/// `bullish`, bearish when above `bearish`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub bullish: f64,
    pub bearish: f64,
}

impl ThresholdBand {
    pub fn is_inverted(&self) -> bool {
        self.bullish <= self.bearish
    }

    /// +1 bullish, -1 bearish, 0 neither, `None` for a missing value.
    pub fn vote(&self, value: f64) -> Option<i8> {
        if value.is_nan() {
            return None;
        }
        let (bull, bear) = if self.is_inverted() {
            (value < self.bullish, value > self.bearish)
        } else {
            (value > self.bullish, value < self.bearish)
        };
        Some(if bull {
            1
        } else if bear {
            -1
        } else {
            0
        })
    }
}

/// Majority vote over per-indicator threshold bands.
///
/// Parameters: `thresholds` (indicator → `{"bullish": x, "bearish": y}`).
#[derive(Debug, Clone)]
pub struct ThresholdRules {
    indicators: Vec<String>,
    bands: Vec<ThresholdBand>,
}

impl ThresholdRules {
    pub const TAG: &'static str = "threshold_rules";

    pub fn from_definition(definition: &ModelDefinition) -> Result<Self, ModelError> {
        let params = ParamReader::new(definition);
        params.require_keys(Self::TAG, &["thresholds"])?;
        let table = params.object("thresholds")?;

        let mut bands = Vec::with_capacity(definition.indicators().len());
        for ind in definition.indicators() {
            let entry = table.get(ind).ok_or_else(|| {
                params.invalid(format!(
                    "indicator '{ind}' has no entry in parameters['thresholds']"
                ))
            })?;
            let band: ThresholdBand = serde_json::from_value(entry.clone()).map_err(|e| {
                params.invalid(format!(
                    "thresholds for '{ind}' must be {{\"bullish\": number, \"bearish\": number}}: {e}"
                ))
            })?;
            if !band.bullish.is_finite() || !band.bearish.is_finite() {
                return Err(params.invalid(format!("thresholds for '{ind}' must be finite")));
            }
            bands.push(band);
        }

        Ok(Self {
            indicators: definition.indicators().to_vec(),
            bands,
        })
    }

    pub fn band(&self, indicator: &str) -> Option<ThresholdBand> {
        self.indicators
            .iter()
            .position(|i| i == indicator)
            .map(|pos| self.bands[pos])
    }
}

impl SignalLogic for ThresholdRules {
    fn logic_type(&self) -> &'static str {
        Self::TAG
    }

    fn compute(&self, subset: &IndicatorMatrix) -> Result<Vec<Option<i8>>, ModelError> {
        let columns: Vec<(&[f64], &ThresholdBand)> = self
            .indicators
            .iter()
            .zip(&self.bands)
            .filter_map(|(name, band)| subset.column(name).map(|c| (c, band)))
            .collect();

        let signal = (0..subset.len())
            .map(|row| {
                let (mut bullish, mut bearish, mut valid) = (0usize, 0usize, 0usize);
                for (values, band) in &columns {
                    match band.vote(values[row]) {
                        Some(1) => bullish += 1,
                        Some(-1) => bearish += 1,
                        Some(_) => {}
                        None => continue,
                    }
                    valid += 1;
                }
                if valid == 0 {
                    None
                } else if 2 * bullish > valid {
                    Some(1)
                } else if 2 * bearish > valid {
                    Some(-1)
                } else {
                    Some(0)
                }
            })
            .collect();
        Ok(signal)
    }
}
