//! Logic registry: the tag → constructor map shared by the factory and loader.

use std::collections::BTreeMap;

use super::definition::ModelDefinition;
use super::error::ModelError;
use super::logic::{SignalLogic, ThresholdRules, WeightedComposite, ZScoreComposite};
use super::DecisionModel;

/// Builds a logic from a definition, validating the parameters it needs.
pub type LogicConstructor = fn(&ModelDefinition) -> Result<Box<dyn SignalLogic>, ModelError>;

/// Registered logic types, ordered by tag.
///
/// Adding a logic means registering one more constructor; the factory, the
/// loader and existing variants are untouched.
#[derive(Clone, Default)]
pub struct LogicRegistry {
    constructors: BTreeMap<String, LogicConstructor>,
}

impl std::fmt::Debug for LogicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl LogicRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in variants: zscore_composite, threshold_rules, weighted_composite.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ZScoreComposite::TAG, build_zscore);
        registry.register(ThresholdRules::TAG, build_threshold);
        registry.register(WeightedComposite::TAG, build_weighted);
        registry
    }

    /// Add or replace the constructor for `tag`.
    pub fn register(&mut self, tag: &str, constructor: LogicConstructor) {
        self.constructors.insert(normalize_tag(tag), constructor);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(&normalize_tag(tag))
    }

    pub fn tags(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Build a model from `definition`. Unknown tag → `UnknownLogic`.
    pub fn build(&self, definition: ModelDefinition) -> Result<DecisionModel, ModelError> {
        let tag = normalize_tag(definition.logic_type());
        let constructor = self
            .constructors
            .get(&tag)
            .ok_or_else(|| ModelError::UnknownLogic {
                logic_type: definition.logic_type().to_string(),
                available: self.tags(),
            })?;
        let logic = constructor(&definition)?;
        Ok(DecisionModel::new(definition, logic))
    }
}

fn build_zscore(d: &ModelDefinition) -> Result<Box<dyn SignalLogic>, ModelError> {
    Ok(Box::new(ZScoreComposite::from_definition(d)?))
}

fn build_threshold(d: &ModelDefinition) -> Result<Box<dyn SignalLogic>, ModelError> {
    Ok(Box::new(ThresholdRules::from_definition(d)?))
}

fn build_weighted(d: &ModelDefinition) -> Result<Box<dyn SignalLogic>, ModelError> {
    Ok(Box::new(WeightedComposite::from_definition(d)?))
}

/// Tags are matched trimmed and lower-cased.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
