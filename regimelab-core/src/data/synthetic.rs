//! Deterministic synthetic indicator matrices.
//!
//! Used for demos and tests when no real indicator file is available. Each
//! column is an AR(1) walk driven by its own `StdRng`, seeded from BLAKE3 of
//! the master seed and the column name, so adding or reordering columns never
//! changes the values of the others.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matrix::{monthly_index, IndicatorMatrix, MatrixError};

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub start: NaiveDate,
    pub months: usize,
    pub seed: u64,
    pub columns: Vec<String>,
    /// AR(1) persistence, in [0, 1).
    pub persistence: f64,
    /// Leading rows left missing in every other column, mimicking series
    /// that start later than the rest.
    pub staggered_start: usize,
}

impl SyntheticSpec {
    /// Every indicator used by the built-in regime presets.
    pub fn with_preset_columns(months: usize, seed: u64) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            months,
            seed,
            columns: crate::regime::preset::all_preset_indicators(),
            persistence: 0.9,
            staggered_start: 0,
        }
    }
}

/// Column seed derived from the master seed and the column name.
pub fn column_seed(master_seed: u64, column: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(column.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

pub fn synthetic_matrix(spec: &SyntheticSpec) -> Result<IndicatorMatrix, MatrixError> {
    let index = monthly_index(spec.start, spec.months);
    let phi = spec.persistence.clamp(0.0, 0.999);

    let columns = spec
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut rng = StdRng::seed_from_u64(column_seed(spec.seed, name));
            let mut level = 0.0;
            let mut values: Vec<f64> = (0..index.len())
                .map(|_| {
                    level = phi * level + rng.gen_range(-1.0..1.0);
                    level
                })
                .collect();
            if i % 2 == 1 {
                let gap = spec.staggered_start.min(values.len());
                values[..gap].fill(f64::NAN);
            }
            (name.clone(), values)
        })
        .collect();

    IndicatorMatrix::new(index, columns)
}
