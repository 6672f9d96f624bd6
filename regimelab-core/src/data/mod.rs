//! Matrix and catalog file I/O.
//!
//! - CSV: first column is the date (`YYYY-MM-DD`, a trailing time part is
//!   ignored), remaining columns numeric; empty / `NaN` / `nan` cells are missing.
//! - Parquet: a `date` column of Date type plus numeric columns, read and
//!   written with polars.
//!
//! Writes are atomic: write to `.tmp`, then rename into place.

mod csv_file;
mod parquet_file;
pub mod synthetic;

pub(crate) use csv_file::{parse_cell, parse_date};
pub use csv_file::{read_matrix_csv, write_matrix_csv};
pub use parquet_file::{read_matrix_parquet, write_matrix_parquet};
pub use synthetic::{synthetic_matrix, SyntheticSpec};

use std::fs;
use std::path::{Path, PathBuf};

use crate::matrix::{IndicatorMatrix, MatrixError};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("invalid matrix in {}: {source}", .path.display())]
    Matrix {
        path: PathBuf,
        #[source]
        source: MatrixError,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row}, column '{column}': {reason}", .path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("parquet error in {}: {reason}", .path.display())]
    Parquet { path: PathBuf, reason: String },

    #[error("unsupported matrix format for {} (expected .csv or .parquet)", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl DataError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn matrix(path: &Path, source: MatrixError) -> Self {
        Self::Matrix {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parquet(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Parquet {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Load a matrix, choosing the reader by file extension.
pub fn load_matrix(path: &Path) -> Result<IndicatorMatrix, DataError> {
    match extension(path).as_deref() {
        Some("csv") => read_matrix_csv(path),
        Some("parquet") => read_matrix_parquet(path),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Save a matrix, choosing the writer by file extension.
pub fn save_matrix(matrix: &IndicatorMatrix, path: &Path) -> Result<(), DataError> {
    match extension(path).as_deref() {
        Some("csv") => write_matrix_csv(matrix, path),
        Some("parquet") => write_matrix_parquet(matrix, path),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Write `bytes` to `path` via a sibling temp file and rename.
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_path(path);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        e
    })
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
