//! Rebuild saved models through the same registry path as the factory.

use tracing::{error, info};

use super::definition::ModelDefinition;
use super::error::ModelError;
use super::registry::LogicRegistry;
use super::store::ModelStore;
use super::DecisionModel;

/// Load one saved model.
///
/// `NotFound` / `CorruptDefinition` come from the store; `UnknownLogic` means
/// the record names a logic this build does not register. The record's
/// `created_at` is kept.
pub fn load_model(
    store: &ModelStore,
    registry: &LogicRegistry,
    name: &str,
) -> Result<DecisionModel, ModelError> {
    let record = store.read_record(name)?;
    if !registry.contains(&record.logic_type) {
        return Err(ModelError::UnknownLogic {
            logic_type: record.logic_type,
            available: registry.tags(),
        });
    }
    let definition = ModelDefinition::from_record(record)?;
    let model = registry.build(definition)?;
    info!(model = model.name(), logic = model.logic_type(), "model loaded");
    Ok(model)
}

#[derive(Debug)]
pub struct LoadFailure {
    pub name: String,
    pub error: ModelError,
}

/// Outcome of loading every saved model.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub models: Vec<DecisionModel>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DecisionModel> {
        self.models.iter().find(|m| m.name() == name)
    }
}

/// Load every saved model independently. A model that fails is logged,
/// reported, and left out; the rest still load.
pub fn load_all_models(
    store: &ModelStore,
    registry: &LogicRegistry,
) -> Result<LoadReport, ModelError> {
    let mut report = LoadReport::default();
    for name in store.list()? {
        match load_model(store, registry, &name) {
            Ok(model) => report.models.push(model),
            Err(e) => {
                error!(model = %name, error = %e, "failed to load model");
                report.failures.push(LoadFailure { name, error: e });
            }
        }
    }
    info!(
        loaded = report.models.len(),
        failed = report.failures.len(),
        "models loaded"
    );
    Ok(report)
}
