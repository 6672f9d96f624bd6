use std::path::PathBuf;

/// Failures raised while defining, building, running, persisting or loading
/// decision models. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid definition for model '{model}': {reason}")]
    InvalidDefinition { model: String, reason: String },

    #[error("unknown logic type '{logic_type}' (registered: {})", .available.join(", "))]
    UnknownLogic {
        logic_type: String,
        available: Vec<String>,
    },

    #[error("indicators not found in catalog: {}", .unknown.join(", "))]
    UnknownIndicators { unknown: Vec<String> },

    #[error("model '{model}' requires indicators missing from the matrix: {}", .missing.join(", "))]
    MissingIndicators { model: String, missing: Vec<String> },

    #[error("model '{model}' produced an invalid signal: {reason}")]
    InvalidSignal { model: String, reason: String },

    #[error("model '{name}' not found (saved models: {})", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("corrupt model definition {}: {reason}", .path.display())]
    CorruptDefinition { path: PathBuf, reason: String },

    #[error("model store I/O at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model record serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn invalid(model: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}
