//! `weighted_composite`: weighted sum of directed expanding z-scores.

use crate::composite::{composite_score, normalize_weights, Aggregation, Direction, Thresholds};
use crate::matrix::IndicatorMatrix;
use crate::model::definition::ModelDefinition;
use crate::model::error::ModelError;

use super::zscore::terms;
use super::{ParamReader, SignalLogic};

/// Weighted sum of directed expanding z-scores.
///
/// Same parameters as `zscore_composite` plus `weights` (indicator → w >= 0,
/// not all zero). Weights are stored raw and normalised when computing.
#[derive(Debug, Clone)]
pub struct WeightedComposite {
    model: String,
    indicators: Vec<String>,
    directions: Vec<Direction>,
    weights: Vec<f64>,
    thresholds: Thresholds,
    min_periods: usize,
}

impl WeightedComposite {
    pub const TAG: &'static str = "weighted_composite";
    const REQUIRED: [&'static str; 4] = ["directions", "weights", "threshold_buy", "threshold_sell"];

    pub fn from_definition(definition: &ModelDefinition) -> Result<Self, ModelError> {
        let params = ParamReader::new(definition);
        params.require_keys(Self::TAG, &Self::REQUIRED)?;
        let indicators = definition.indicators();

        let table = params.object("weights")?;
        let mut weights = Vec::with_capacity(indicators.len());
        for ind in indicators {
            let v = table.get(ind).ok_or_else(|| {
                params.invalid(format!("indicator '{ind}' has no entry in parameters['weights']"))
            })?;
            match v.as_f64() {
                Some(w) if w.is_finite() && w >= 0.0 => weights.push(w),
                _ => {
                    return Err(params.invalid(format!(
                        "weight for '{ind}' must be a non-negative number, got {v}"
                    )))
                }
            }
        }
        if normalize_weights(&weights).is_none() {
            return Err(params.invalid("weights sum to zero"));
        }

        Ok(Self {
            model: definition.name().to_string(),
            indicators: indicators.to_vec(),
            directions: params.directions(indicators)?,
            weights,
            thresholds: params.thresholds()?,
            min_periods: params.min_periods()?,
        })
    }

    /// Weights scaled to sum to 1, in indicator order.
    pub fn normalized_weights(&self) -> Vec<f64> {
        normalize_weights(&self.weights).unwrap_or_default()
    }

    pub fn composite(&self, subset: &IndicatorMatrix) -> Result<Vec<f64>, ModelError> {
        let terms = terms(
            &self.model,
            subset,
            &self.indicators,
            &self.directions,
            Some(&self.weights),
        )?;
        Ok(composite_score(
            &terms,
            subset.len(),
            self.min_periods,
            Aggregation::WeightedSum,
        ))
    }
}

impl SignalLogic for WeightedComposite {
    fn logic_type(&self) -> &'static str {
        Self::TAG
    }

    fn compute(&self, subset: &IndicatorMatrix) -> Result<Vec<Option<i8>>, ModelError> {
        Ok(self.thresholds.discretize(&self.composite(subset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::logic::test_support::{definition, matrix};
    use serde_json::json;

    fn params(weights: serde_json::Value) -> serde_json::Value {
        json!({
            "directions": {"a": 1, "b": -1},
            "weights": weights,
            "threshold_buy": 0.5,
            "threshold_sell": -0.5,
            "min_periods": 3
        })
    }

    #[test]
    fn zero_weight_sum_is_invalid() {
        let def = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": 0, "b": 0})));
        let err = WeightedComposite::from_definition(&def).unwrap_err();
        assert!(err.to_string().contains("sum to zero"), "{err}");
    }

    #[test]
    fn negative_weight_is_invalid() {
        let def = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": -1, "b": 2})));
        assert!(WeightedComposite::from_definition(&def).is_err());
    }

    #[test]
    fn weights_normalised_at_compute_time() {
        let def = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": 3, "b": 1})));
        let model = WeightedComposite::from_definition(&def).unwrap();
        assert_eq!(model.normalized_weights(), vec![0.75, 0.25]);

        let a = vec![1.0, 2.0, 3.0, 4.0, 9.0];
        let b = vec![5.0, 4.0, 6.0, 5.0, 5.0];
        let m = matrix(&[("a", a.clone()), ("b", b.clone())]);
        let composite = model.composite(&m).unwrap();
        let za = crate::stats::expanding_zscore(&a, 3);
        let zb = crate::stats::expanding_zscore(&b, 3);
        let expected = 0.75 * za[4] - 0.25 * zb[4];
        assert!((composite[4] - expected).abs() < 1e-12);
        assert!(composite[1].is_nan());
    }

    #[test]
    fn zero_weight_indicator_does_not_move_the_score() {
        let def = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": 1, "b": 0})));
        let model = WeightedComposite::from_definition(&def).unwrap();
        let a = vec![1.0, 2.0, 3.0, 4.0, 9.0];
        let m = matrix(&[("a", a.clone()), ("b", vec![0.0, 10.0, -3.0, 7.0, 100.0])]);
        let composite = model.composite(&m).unwrap();
        let za = crate::stats::expanding_zscore(&a, 3);
        assert!((composite[4] - za[4]).abs() < 1e-12);
    }

    #[test]
    fn huge_weights_behave_like_equal_weights() {
        let huge = definition(
            &["a", "b"],
            WeightedComposite::TAG,
            params(json!({"a": 1e308, "b": 1e308})),
        );
        let equal = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": 1, "b": 1})));
        let huge = WeightedComposite::from_definition(&huge).unwrap();
        let equal = WeightedComposite::from_definition(&equal).unwrap();
        assert_eq!(huge.normalized_weights(), vec![0.5, 0.5]);

        let m = matrix(&[
            ("a", vec![1.0, 2.0, 3.0, 4.0, 9.0]),
            ("b", vec![5.0, 4.0, 6.0, 5.0, 8.0]),
        ]);
        let h = huge.composite(&m).unwrap();
        let e = equal.composite(&m).unwrap();
        assert!(h[4].is_finite());
        assert!((h[4] - e[4]).abs() < 1e-12);
    }

    #[test]
    fn partial_row_keeps_full_weight_normalisation() {
        let def = definition(&["a", "b"], WeightedComposite::TAG, params(json!({"a": 1, "b": 1})));
        let model = WeightedComposite::from_definition(&def).unwrap();
        let a = vec![1.0, 2.0, 3.0, 4.0, 9.0];
        let b = vec![5.0, 4.0, 6.0, 5.0, f64::NAN];
        let m = matrix(&[("a", a.clone()), ("b", b)]);
        let composite = model.composite(&m).unwrap();
        // b is missing on the last row: a keeps its 0.5 share, no re-normalisation.
        let za = crate::stats::expanding_zscore(&a, 3);
        assert!((composite[4] - 0.5 * za[4]).abs() < 1e-12);
    }
}
