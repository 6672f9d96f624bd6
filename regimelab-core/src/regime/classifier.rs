use crate::composite::Direction;
use crate::matrix::IndicatorMatrix;

use super::{RegimeError, RegimeFrame};

/// A named regime classifier.
pub trait RegimeClassifier: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Input indicators with their orientation.
    fn indicators(&self) -> &[(String, Direction)];

    /// Classify every row of `matrix`. Indicators absent from the matrix are
    /// skipped; a classifier left with none fails with `NoIndicatorsAvailable`.
    fn classify(&self, matrix: &IndicatorMatrix) -> Result<RegimeFrame, RegimeError>;
}
