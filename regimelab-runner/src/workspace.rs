//! One project directory's worth of state: configuration, the logic registry,
//! the regime selector, both stores, and the indicator matrix (loaded on first
//! use and kept for the rest of the session).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use regimelab_core::data::{self, DataError};
use regimelab_core::model::{
    self, CreateOptions, DecisionModel, LoadReport, LogicRegistry, ModelError, ModelRequest,
    ModelStore,
};
use regimelab_core::regime::{
    RegimeClassifier, RegimeError, RegimeFrame, RegimeSelector, RegimeStore, RegimeTable,
};
use regimelab_core::{IndicatorCatalog, IndicatorMatrix};

use crate::config::{ConfigError, RegimelabConfig};
use crate::export::SignalTable;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Regime(#[from] RegimeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug)]
pub struct Workspace {
    config: RegimelabConfig,
    registry: LogicRegistry,
    selector: RegimeSelector,
    models: ModelStore,
    regimes: RegimeStore,
    matrix: Option<IndicatorMatrix>,
}

impl Workspace {
    pub fn new(config: RegimelabConfig) -> Self {
        let selector = RegimeSelector::from_presets(config.regime_presets());
        let models = ModelStore::new(&config.paths.models_dir);
        let regimes = RegimeStore::new(&config.paths.regimes_dir);
        Self {
            config,
            registry: LogicRegistry::builtin(),
            selector,
            models,
            regimes,
            matrix: None,
        }
    }

    /// Use `matrix` instead of reading `paths.indicators`.
    pub fn with_matrix(mut self, matrix: IndicatorMatrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn config(&self) -> &RegimelabConfig {
        &self.config
    }

    pub fn registry(&self) -> &LogicRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LogicRegistry {
        &mut self.registry
    }

    pub fn selector(&self) -> &RegimeSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut RegimeSelector {
        &mut self.selector
    }

    pub fn model_store(&self) -> &ModelStore {
        &self.models
    }

    pub fn regime_store(&self) -> &RegimeStore {
        &self.regimes
    }

    /// The indicator matrix, read from `paths.indicators` on first call.
    pub fn matrix(&mut self) -> Result<&IndicatorMatrix, WorkspaceError> {
        cached_matrix(&mut self.matrix, &self.config.paths.indicators)
    }

    /// Indicator catalog, from the first source available: the metadata CSV,
    /// the matrix CSV header, the matrix itself. Empty when none exists.
    pub fn catalog(&mut self) -> Result<IndicatorCatalog, WorkspaceError> {
        let metadata = &self.config.paths.metadata;
        if metadata.is_file() {
            return Ok(IndicatorCatalog::from_metadata_csv(metadata)?);
        }

        let indicators = &self.config.paths.indicators;
        if self.matrix.is_none() && is_csv(indicators) {
            return Ok(IndicatorCatalog::from_matrix_csv_header(indicators)?);
        }
        if self.matrix.is_some() || indicators.is_file() {
            let matrix = cached_matrix(&mut self.matrix, indicators)?;
            return Ok(IndicatorCatalog::from_matrix(matrix));
        }

        warn!(
            metadata = %metadata.display(),
            indicators = %indicators.display(),
            "no indicator catalog source found"
        );
        Ok(IndicatorCatalog::new())
    }

    /// Build a model through the factory, optionally saving it and tagging it
    /// with the regime it belongs to.
    pub fn create_model(
        &mut self,
        request: ModelRequest,
        validate: bool,
        save: bool,
        regime: Option<&str>,
    ) -> Result<DecisionModel, WorkspaceError> {
        let regime = match regime {
            None => None,
            Some(_) if !save => {
                return Err(WorkspaceError::Invalid(
                    "a regime can only be associated with a saved model".into(),
                ))
            }
            Some(name) => Some(self.selector.get(name)?.name().to_string()),
        };

        let catalog = if validate {
            self.catalog()?
        } else {
            IndicatorCatalog::new()
        };
        let options = CreateOptions {
            validate_against_catalog: validate,
            store: save.then_some(&self.models),
        };
        let model = model::create_model(&self.registry, &catalog, request, options)?;

        match regime {
            None => Ok(model),
            Some(regime) => {
                self.models.associate_regime(model.name(), &regime)?;
                info!(model = model.name(), regime = %regime, "model associated with regime");
                Ok(model::load_model(&self.models, &self.registry, model.name())?)
            }
        }
    }

    pub fn load_model(&self, name: &str) -> Result<DecisionModel, WorkspaceError> {
        Ok(model::load_model(&self.models, &self.registry, name)?)
    }

    pub fn list_models(&self) -> Result<Vec<String>, WorkspaceError> {
        Ok(self.models.list()?)
    }

    pub fn load_all_models(&self) -> Result<LoadReport, WorkspaceError> {
        Ok(model::load_all_models(&self.models, &self.registry)?)
    }

    /// Signals of the named models over the workspace matrix. With no names,
    /// every saved model that loads is run.
    pub fn run_models(&mut self, names: &[String]) -> Result<SignalTable, WorkspaceError> {
        let models = if names.is_empty() {
            self.load_all_models()?.models
        } else {
            let mut seen = BTreeSet::new();
            names
                .iter()
                .filter(|n| seen.insert(n.as_str()))
                .map(|n| self.load_model(n))
                .collect::<Result<Vec<_>, _>>()?
        };

        let matrix = cached_matrix(&mut self.matrix, &self.config.paths.indicators)?;
        let mut table = SignalTable::new(matrix.index().to_vec(), matrix.dataset_hash());
        for model in &models {
            let signal = model.generate_signal(matrix)?;
            table
                .push(model.name(), signal)
                .map_err(WorkspaceError::Invalid)?;
        }
        info!(models = models.len(), rows = matrix.len(), "signal table built");
        Ok(table)
    }

    /// Classify one regime, persisting `regime_<name>.csv` when `save` is set.
    pub fn get_regime(&mut self, name: &str, save: bool) -> Result<RegimeFrame, WorkspaceError> {
        let matrix = cached_matrix(&mut self.matrix, &self.config.paths.indicators)?;
        let frame = self.selector.get_regime(name, matrix)?;
        if save {
            let path = self.regimes.save(&frame)?;
            info!(regime = %frame.classifier, path = %path.display(), "regime saved");
        }
        Ok(frame)
    }

    /// Every registered regime. With `save`, each frame and the combined
    /// `regimes_all.csv` are written.
    pub fn get_all_regimes(&mut self, save: bool) -> Result<RegimeTable, WorkspaceError> {
        let matrix = cached_matrix(&mut self.matrix, &self.config.paths.indicators)?;
        let table = self.selector.get_all_regimes(matrix);
        if save {
            for frame in &table.frames {
                self.regimes.save(frame)?;
            }
            let path = self.regimes.save_all(&table)?;
            info!(
                regimes = table.frames.len(),
                path = %path.display(),
                "regimes saved"
            );
        }
        Ok(table)
    }

    /// Paths `get_all_regimes(true)` writes to, in write order.
    pub fn regime_output_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .selector
            .names()
            .iter()
            .map(|n| self.regimes.path_for(n))
            .collect();
        paths.push(self.regimes.all_path());
        paths
    }
}

fn cached_matrix<'a>(
    slot: &'a mut Option<IndicatorMatrix>,
    path: &Path,
) -> Result<&'a IndicatorMatrix, WorkspaceError> {
    let matrix = match slot.take() {
        Some(matrix) => matrix,
        None => {
            let matrix = data::load_matrix(path)?;
            info!(
                path = %path.display(),
                rows = matrix.len(),
                columns = matrix.n_columns(),
                "indicator matrix loaded"
            );
            matrix
        }
    };
    Ok(slot.insert(matrix))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regimelab_core::data::{synthetic_matrix, SyntheticSpec};
    use regimelab_core::matrix::monthly_index;
    use serde_json::json;

    fn config_in(dir: &Path) -> RegimelabConfig {
        let mut config = RegimelabConfig::default();
        config.paths.indicators = dir.join("indicators.csv");
        config.paths.metadata = dir.join("metadata.csv");
        config.paths.models_dir = dir.join("models");
        config.paths.regimes_dir = dir.join("regimes");
        config
    }

    fn small_matrix() -> IndicatorMatrix {
        let index = monthly_index(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(), 30);
        let a: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin()).collect();
        let b: Vec<f64> = (0..30).map(|i| (i as f64 * 0.3).cos()).collect();
        IndicatorMatrix::new(index, vec![("a".into(), a), ("b".into(), b)]).unwrap()
    }

    fn request(name: &str) -> ModelRequest {
        serde_json::from_value(json!({
            "name": name,
            "indicators": ["a", "b"],
            "logic_type": "zscore_composite",
            "parameters": {
                "directions": {"a": 1, "b": -1},
                "threshold_buy": 0.5,
                "threshold_sell": -0.5,
                "min_periods": 6
            }
        }))
        .unwrap()
    }

    #[test]
    fn matrix_is_read_lazily_from_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        data::save_matrix(&small_matrix(), &config.paths.indicators).unwrap();

        let mut ws = Workspace::new(config);
        assert!(ws.matrix.is_none());
        assert_eq!(ws.matrix().unwrap().len(), 30);
        assert!(ws.matrix.is_some());
    }

    #[test]
    fn missing_matrix_file_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(config_in(dir.path()));
        assert!(matches!(ws.matrix(), Err(WorkspaceError::Data(_))));
    }

    #[test]
    fn catalog_prefers_metadata_then_header() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        data::save_matrix(&small_matrix(), &config.paths.indicators).unwrap();

        let mut ws = Workspace::new(config.clone());
        let from_header = ws.catalog().unwrap();
        assert_eq!(from_header.names().collect::<Vec<_>>(), vec!["a", "b"]);

        IndicatorCatalog::from_names(["a"])
            .write_metadata_csv(&config.paths.metadata)
            .unwrap();
        let from_metadata = ws.catalog().unwrap();
        assert_eq!(from_metadata.len(), 1);
    }

    #[test]
    fn catalog_without_sources_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(config_in(dir.path()));
        assert!(ws.catalog().unwrap().is_empty());
    }

    #[test]
    fn create_validates_against_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        IndicatorCatalog::from_names(["a"])
            .write_metadata_csv(&config.paths.metadata)
            .unwrap();
        let mut ws = Workspace::new(config);

        let err = ws.create_model(request("m"), true, false, None).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Model(ModelError::UnknownIndicators { .. })
        ));
        assert!(ws.create_model(request("m"), false, false, None).is_ok());
    }

    #[test]
    fn create_with_regime_saves_association() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(config_in(dir.path())).with_matrix(small_matrix());

        let model = ws
            .create_model(request("tilt"), true, true, Some(" Financial "))
            .unwrap();
        assert_eq!(model.definition().associated_regime(), Some("financial"));
        assert_eq!(ws.list_models().unwrap(), vec!["tilt".to_string()]);
        let reloaded = ws.load_model("tilt").unwrap();
        assert_eq!(reloaded.definition().associated_regime(), Some("financial"));
    }

    #[test]
    fn create_rejects_regime_without_save_or_unknown_regime() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(config_in(dir.path())).with_matrix(small_matrix());
        assert!(matches!(
            ws.create_model(request("m"), false, false, Some("macro")),
            Err(WorkspaceError::Invalid(_))
        ));
        assert!(matches!(
            ws.create_model(request("m"), false, true, Some("sentiment")),
            Err(WorkspaceError::Regime(RegimeError::UnknownClassifier { .. }))
        ));
        assert!(!ws.model_store().exists("m"));
    }

    #[test]
    fn run_models_builds_one_column_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new(config_in(dir.path())).with_matrix(small_matrix());
        ws.create_model(request("one"), false, true, None).unwrap();
        ws.create_model(request("two"), false, true, None).unwrap();

        let all = ws.run_models(&[]).unwrap();
        assert_eq!(all.models().collect::<Vec<_>>(), vec!["one", "two"]);

        let picked = ws
            .run_models(&["two".to_string(), "two".to_string()])
            .unwrap();
        assert_eq!(picked.models().collect::<Vec<_>>(), vec!["two"]);
        assert_eq!(picked.signal("two"), all.signal("two"));
        assert_eq!(picked.index().len(), 30);
    }

    #[test]
    fn regimes_are_saved_where_configured() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = synthetic_matrix(&SyntheticSpec::with_preset_columns(48, 7)).unwrap();
        let mut ws = Workspace::new(config_in(dir.path())).with_matrix(matrix);

        let frame = ws.get_regime("macro", true).unwrap();
        assert_eq!(frame.len(), 48);
        assert!(ws.regime_store().path_for("macro").is_file());
        assert!(!ws.regime_store().path_for("financial").exists());

        let table = ws.get_all_regimes(true).unwrap();
        assert_eq!(table.frames.len(), 3);
        for path in ws.regime_output_paths() {
            assert!(path.is_file(), "{}", path.display());
        }
    }
}
