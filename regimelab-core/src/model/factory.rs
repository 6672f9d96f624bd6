//! Model factory: the one path from a user request to a runnable model.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::definition::{ModelDefinition, Parameters};
use super::error::ModelError;
use super::registry::{normalize_tag, LogicRegistry};
use super::store::ModelStore;
use super::DecisionModel;
use crate::catalog::IndicatorCatalog;

/// What a user asks for. Deserialisable from the same JSON shape as a model
/// record, minus the derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub name: String,
    pub indicators: Vec<String>,
    pub logic_type: String,
    pub parameters: Parameters,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateOptions<'a> {
    /// Check requested indicators against the catalog (skipped when the
    /// catalog is empty).
    pub validate_against_catalog: bool,
    /// Persist the new model here.
    pub store: Option<&'a ModelStore>,
}

impl Default for CreateOptions<'_> {
    fn default() -> Self {
        Self {
            validate_against_catalog: true,
            store: None,
        }
    }
}

pub fn create_model(
    registry: &LogicRegistry,
    catalog: &IndicatorCatalog,
    request: ModelRequest,
    options: CreateOptions<'_>,
) -> Result<DecisionModel, ModelError> {
    let logic_type = normalize_tag(&request.logic_type);
    if !registry.contains(&logic_type) {
        return Err(ModelError::UnknownLogic {
            logic_type: request.logic_type,
            available: registry.tags(),
        });
    }

    if options.validate_against_catalog {
        if catalog.is_empty() {
            info!(model = %request.name, "indicator catalog is empty, skipping indicator check");
        } else {
            let unknown = catalog.unknown(&request.indicators);
            if !unknown.is_empty() {
                return Err(ModelError::UnknownIndicators { unknown });
            }
        }
    }

    let definition = ModelDefinition::new(
        request.name,
        request.indicators,
        logic_type,
        request.parameters,
        request.description,
    )?;
    let model = registry.build(definition)?;

    if let Some(store) = options.store {
        let path = store.save(model.definition())?;
        info!(model = model.name(), path = %path.display(), "model saved");
    }
    info!(
        model = model.name(),
        logic = model.logic_type(),
        indicators = model.indicators().len(),
        "model created"
    );
    Ok(model)
}
