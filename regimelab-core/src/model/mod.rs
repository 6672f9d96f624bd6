//! Decision models: a validated definition paired with a signal logic.
//!
//! `DecisionModel::generate_signal` is the single enforcement point of the
//! model contract. Whatever the logic, the matrix is checked for the declared
//! indicators first and the logic's output is validated afterwards.

pub mod definition;
pub mod error;
pub mod factory;
pub mod loader;
pub mod logic;
pub mod registry;
pub mod signal;
pub mod store;

pub use definition::{ModelDefinition, ModelRecord, Parameters};
pub use error::ModelError;
pub use factory::{create_model, CreateOptions, ModelRequest};
pub use loader::{load_all_models, load_model, LoadFailure, LoadReport};
pub use logic::SignalLogic;
pub use registry::{LogicConstructor, LogicRegistry};
pub use signal::{Decision, SignalSeries};
pub use store::ModelStore;

use tracing::{debug, info};

use crate::matrix::IndicatorMatrix;

/// A runnable model.
#[derive(Debug)]
pub struct DecisionModel {
    definition: ModelDefinition,
    logic: Box<dyn SignalLogic>,
}

impl DecisionModel {
    pub fn new(definition: ModelDefinition, logic: Box<dyn SignalLogic>) -> Self {
        Self { definition, logic }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn indicators(&self) -> &[String] {
        self.definition.indicators()
    }

    pub fn logic_type(&self) -> &str {
        self.logic.logic_type()
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub fn logic(&self) -> &dyn SignalLogic {
        self.logic.as_ref()
    }

    pub fn to_record(&self) -> ModelRecord {
        self.definition.to_record()
    }

    pub fn fingerprint(&self) -> String {
        self.definition.fingerprint()
    }

    /// Compute the validated signal for `matrix`.
    ///
    /// Fails with `MissingIndicators` (nothing computed) when any declared
    /// indicator is absent, and with `InvalidSignal` when the logic returns
    /// the wrong length or a value outside {-1, 0, 1}.
    pub fn generate_signal(&self, matrix: &IndicatorMatrix) -> Result<SignalSeries, ModelError> {
        let missing = matrix.missing_columns(self.indicators());
        if !missing.is_empty() {
            return Err(ModelError::MissingIndicators {
                model: self.name().to_string(),
                missing,
            });
        }

        let subset = matrix
            .select(self.indicators())
            .map_err(|e| ModelError::invalid(self.name(), e.to_string()))?;
        debug!(
            model = self.name(),
            logic = self.logic_type(),
            rows = subset.len(),
            "computing signal"
        );

        let raw = self.logic.compute(&subset)?;
        let signal = SignalSeries::from_raw(subset.index(), &raw).map_err(|reason| {
            ModelError::InvalidSignal {
                model: self.name().to_string(),
                reason,
            }
        })?;

        let counts = signal.counts();
        let count = |d: Decision| counts.get(&d).copied().unwrap_or(0);
        info!(
            model = self.name(),
            rows = signal.len(),
            valid = signal.valid_count(),
            increase = count(Decision::Increase),
            hold = count(Decision::Hold),
            reduce = count(Decision::Reduce),
            "signal generated"
        );
        Ok(signal)
    }
}
