//! Indicator catalog: the read-only list of indicator names (with optional
//! metadata) that the factory checks model requests against.
//!
//! The catalog is an explicit value. Producers build one with `register` and
//! hand it to whoever needs it; nothing is kept in process-wide state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::DataError;
use crate::matrix::IndicatorMatrix;

/// One row of `indicators_metadata.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorMeta {
    pub indicator: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default)]
    pub natural_lag: String,
    #[serde(default)]
    pub limitations: String,
}

fn default_frequency() -> String {
    "monthly".to_string()
}

impl IndicatorMeta {
    /// Metadata with only a name (e.g. taken from a matrix header).
    pub fn bare(indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            category: String::new(),
            description: String::new(),
            source: String::new(),
            frequency: default_frequency(),
            natural_lag: String::new(),
            limitations: String::new(),
        }
    }
}

/// Known indicators keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorCatalog {
    entries: BTreeMap<String, IndicatorMeta>,
}

impl IndicatorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for name in names {
            catalog.register(IndicatorMeta::bare(name));
        }
        catalog
    }

    /// Every column of `matrix`.
    pub fn from_matrix(matrix: &IndicatorMatrix) -> Self {
        Self::from_names(matrix.column_names().iter().cloned())
    }

    /// Add or replace an entry.
    pub fn register(&mut self, meta: IndicatorMeta) -> &mut Self {
        self.entries.insert(meta.indicator.clone(), meta);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty catalog disables the factory's indicator check.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorMeta> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndicatorMeta> {
        self.entries.values()
    }

    /// Requested names absent from the catalog, in request order.
    pub fn unknown<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        requested
            .iter()
            .map(|s| s.as_ref())
            .filter(|n| !self.contains(n))
            .map(str::to_string)
            .collect()
    }

    /// Indicator count per category (uncategorised entries under "").
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for meta in self.entries.values() {
            *counts.entry(meta.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Load `indicators_metadata.csv`. A missing file gives an empty catalog.
    pub fn from_metadata_csv(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            warn!(path = %path.display(), "indicator metadata not found, catalog is empty");
            return Ok(Self::new());
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
        let mut catalog = Self::new();
        for row in reader.deserialize::<IndicatorMeta>() {
            catalog.register(row.map_err(|e| DataError::csv(path, e))?);
        }
        info!(path = %path.display(), indicators = catalog.len(), "loaded indicator metadata");
        Ok(catalog)
    }

    /// Column names from the header of an indicator-matrix CSV (the first
    /// column is the date index). A missing file gives an empty catalog.
    pub fn from_matrix_csv_header(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            warn!(path = %path.display(), "indicator matrix not found, catalog is empty");
            return Ok(Self::new());
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
        let headers = reader.headers().map_err(|e| DataError::csv(path, e))?;
        let catalog = Self::from_names(headers.iter().skip(1).map(str::to_string));
        info!(path = %path.display(), indicators = catalog.len(), "catalog from matrix header");
        Ok(catalog)
    }

    /// Write the catalog back out as `indicators_metadata.csv`.
    pub fn write_metadata_csv(&self, path: &Path) -> Result<(), DataError> {
        let mut writer = csv::Writer::from_writer(vec![]);
        for meta in self.entries.values() {
            writer.serialize(meta).map_err(|e| DataError::csv(path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DataError::io(path, e.into_error()))?;
        crate::data::write_atomic(path, &bytes).map_err(|e| DataError::io(path, e))
    }
}
