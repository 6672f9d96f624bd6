//! `zscore_composite`: mean of directed expanding z-scores.

use crate::composite::{composite_score, Aggregation, Direction, Term, Thresholds};
use crate::matrix::IndicatorMatrix;
use crate::model::definition::ModelDefinition;
use crate::model::error::ModelError;

use super::{ParamReader, SignalLogic};

/// Mean of directed expanding z-scores, discretised by buy/sell thresholds.
///
/// Parameters: `directions` (indicator → ±1), `threshold_buy`,
/// `threshold_sell`, optional `min_periods` (default 24).
#[derive(Debug, Clone)]
pub struct ZScoreComposite {
    model: String,
    indicators: Vec<String>,
    directions: Vec<Direction>,
    thresholds: Thresholds,
    min_periods: usize,
}

impl ZScoreComposite {
    pub const TAG: &'static str = "zscore_composite";
    const REQUIRED: [&'static str; 3] = ["directions", "threshold_buy", "threshold_sell"];

    pub fn from_definition(definition: &ModelDefinition) -> Result<Self, ModelError> {
        let params = ParamReader::new(definition);
        params.require_keys(Self::TAG, &Self::REQUIRED)?;

        Ok(Self {
            model: definition.name().to_string(),
            indicators: definition.indicators().to_vec(),
            directions: params.directions(definition.indicators())?,
            thresholds: params.thresholds()?,
            min_periods: params.min_periods()?,
        })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Continuous composite before discretisation.
    pub fn composite(&self, subset: &IndicatorMatrix) -> Result<Vec<f64>, ModelError> {
        let terms = terms(
            &self.model,
            subset,
            &self.indicators,
            &self.directions,
            None,
        )?;
        Ok(composite_score(
            &terms,
            subset.len(),
            self.min_periods,
            Aggregation::Mean,
        ))
    }
}

impl SignalLogic for ZScoreComposite {
    fn logic_type(&self) -> &'static str {
        Self::TAG
    }

    fn compute(&self, subset: &IndicatorMatrix) -> Result<Vec<Option<i8>>, ModelError> {
        Ok(self.thresholds.discretize(&self.composite(subset)?))
    }
}

/// Look up each indicator column and pair it with its direction (and weight).
pub(super) fn terms<'a>(
    model: &str,
    subset: &'a IndicatorMatrix,
    indicators: &[String],
    directions: &[Direction],
    weights: Option<&[f64]>,
) -> Result<Vec<Term<'a>>, ModelError> {
    let missing = subset.missing_columns(indicators);
    if !missing.is_empty() {
        return Err(ModelError::MissingIndicators {
            model: model.to_string(),
            missing,
        });
    }
    Ok(indicators
        .iter()
        .zip(directions)
        .enumerate()
        .filter_map(|(i, (name, dir))| {
            let values = subset.column(name)?;
            Some(match weights {
                Some(w) => Term::weighted(values, *dir, w[i]),
                None => Term::new(values, *dir),
            })
        })
        .collect())
}
