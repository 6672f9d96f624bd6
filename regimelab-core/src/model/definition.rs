//! Model definitions and their persisted record form.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ModelError;

/// Free-form logic parameters, exactly as declared and persisted.
pub type Parameters = Map<String, Value>;

/// The declarative half of a model: what it looks at and how it is configured.
///
/// Built once, validated by `new`, then handed to a logic constructor which
/// checks the logic-specific parameter keys. The model owns its own copies of
/// `indicators` and `parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    name: String,
    indicators: Vec<String>,
    logic_type: String,
    parameters: Parameters,
    description: String,
    created_at: NaiveDateTime,
    associated_regime: Option<String>,
}

impl ModelDefinition {
    pub fn new(
        name: impl Into<String>,
        indicators: Vec<String>,
        logic_type: impl Into<String>,
        parameters: Parameters,
        description: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        validate_name(&name)?;
        validate_indicators(&name, &indicators)?;

        Ok(Self {
            name,
            indicators,
            logic_type: logic_type.into(),
            parameters,
            description: description.into(),
            created_at: Local::now().naive_local().trunc_subsecs(0),
            associated_regime: None,
        })
    }

    /// Rebuild from a persisted record, keeping its original timestamp.
    pub fn from_record(record: ModelRecord) -> Result<Self, ModelError> {
        let mut definition = Self::new(
            record.name,
            record.indicators,
            record.logic_type,
            record.parameters,
            record.description,
        )?;
        if let Some(created_at) = record.created_at {
            definition.created_at = created_at;
        }
        definition.associated_regime = record.associated_regime;
        Ok(definition)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn logic_type(&self) -> &str {
        &self.logic_type
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn associated_regime(&self) -> Option<&str> {
        self.associated_regime.as_deref()
    }

    pub fn to_record(&self) -> ModelRecord {
        ModelRecord {
            name: self.name.clone(),
            indicators: self.indicators.clone(),
            logic_type: self.logic_type.clone(),
            parameters: self.parameters.clone(),
            description: self.description.clone(),
            created_at: Some(self.created_at),
            n_indicators: self.indicators.len(),
            associated_regime: self.associated_regime.clone(),
        }
    }

    /// BLAKE3 over logic type, indicators and parameters.
    ///
    /// Name, description and timestamps are excluded: two definitions with the
    /// same fingerprint produce the same signal on any matrix.
    pub fn fingerprint(&self) -> String {
        // serde_json::Map is key-sorted, so the JSON is canonical.
        let canonical = serde_json::json!({
            "logic_type": self.logic_type,
            "indicators": self.indicators,
            "parameters": self.parameters,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::invalid(name, "name must be a non-empty string"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ModelError::invalid(
            name,
            "name must not contain whitespace (use underscores)",
        ));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ModelError::invalid(name, "name must not be a path"));
    }
    Ok(())
}

fn validate_indicators(name: &str, indicators: &[String]) -> Result<(), ModelError> {
    if indicators.is_empty() {
        return Err(ModelError::invalid(name, "at least one indicator is required"));
    }
    for (i, ind) in indicators.iter().enumerate() {
        if ind.trim().is_empty() {
            return Err(ModelError::invalid(name, "indicator names must be non-empty"));
        }
        if indicators[..i].contains(ind) {
            return Err(ModelError::invalid(
                name,
                format!("indicator '{ind}' is listed more than once"),
            ));
        }
    }
    Ok(())
}

/// On-disk JSON form of a model definition.
///
/// `n_indicators` is redundant with `indicators.len()` and kept for people
/// reading the file. `associated_regime` is organisational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub indicators: Vec<String>,
    pub logic_type: String,
    pub parameters: Parameters,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub n_indicators: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_regime: Option<String>,
}

impl ModelRecord {
    /// Fields a record must carry to be loadable.
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["name", "indicators", "logic_type", "parameters"];
}
