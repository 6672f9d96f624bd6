//! Model store: one pretty-printed JSON record per model, `<dir>/<name>.json`.
//!
//! Writes are atomic (temp file + rename) and last-writer-wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::definition::{validate_name, ModelDefinition, ModelRecord};
use super::error::ModelError;
use crate::data::write_atomic;

#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_for(name).is_file()
    }

    /// Write `definition`, replacing any previous record with the same name.
    pub fn save(&self, definition: &ModelDefinition) -> Result<PathBuf, ModelError> {
        self.write_record(&definition.to_record())
    }

    fn write_record(&self, record: &ModelRecord) -> Result<PathBuf, ModelError> {
        validate_name(&record.name)?;
        let path = self.path_for(&record.name);
        let json = serde_json::to_string_pretty(record)?;
        write_atomic(&path, json.as_bytes()).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(model = %record.name, path = %path.display(), "model record written");
        Ok(path)
    }

    /// Saved model names (file stems), sorted. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>, ModelError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ModelError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Read and check a record without building the model.
    ///
    /// `InvalidDefinition` when `name` is not a valid model name; `NotFound`
    /// when there is no file; `CorruptDefinition` when the file is not a JSON
    /// object carrying every required field with the right type, or names a
    /// different model than its file.
    pub fn read_record(&self, name: &str) -> Result<ModelRecord, ModelError> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(ModelError::NotFound {
                name: name.to_string(),
                available: self.list()?,
            });
        }

        let text = fs::read_to_string(&path).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;
        let corrupt = |reason: String| ModelError::CorruptDefinition {
            path: path.clone(),
            reason,
        };

        let value: Value =
            serde_json::from_str(&text).map_err(|e| corrupt(format!("not valid JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| corrupt("top level is not a JSON object".to_string()))?;
        let missing: Vec<&str> = ModelRecord::REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !object.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            return Err(corrupt(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let record: ModelRecord =
            serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        if record.name != name {
            return Err(corrupt(format!(
                "record names model '{}' but is stored as '{name}'",
                record.name
            )));
        }
        Ok(record)
    }

    /// Tag a saved model with the regime it was built for.
    pub fn associate_regime(&self, name: &str, regime: &str) -> Result<PathBuf, ModelError> {
        let mut record = self.read_record(name)?;
        record.associated_regime = Some(regime.to_string());
        self.write_record(&record)
    }

    pub fn remove(&self, name: &str) -> Result<(), ModelError> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(ModelError::NotFound {
                name: name.to_string(),
                available: self.list()?,
            });
        }
        fs::remove_file(&path).map_err(|source| ModelError::Io { path, source })
    }
}
