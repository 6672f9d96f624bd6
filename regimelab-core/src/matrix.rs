//! Indicator matrix: the dated, column-named input consumed by every model.
//!
//! Rows are calendar dates (strictly ascending, unique). Columns are named
//! `f64` series of equal length with NaN as the "no data" marker. The engine
//! never mutates a matrix; `select` returns a new one.

use chrono::NaiveDate;

/// Shape and index violations detected when building a matrix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    #[error("date index not strictly ascending at row {row}: {previous} then {current}")]
    UnsortedIndex {
        row: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("column '{column}' has {actual} rows, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("columns not in matrix: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorMatrix {
    index: Vec<NaiveDate>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl IndicatorMatrix {
    pub fn new(index: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self, MatrixError> {
        for (row, pair) in index.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(MatrixError::UnsortedIndex {
                    row: row + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (name, series) in columns {
            if names.contains(&name) {
                return Err(MatrixError::DuplicateColumn(name));
            }
            if series.len() != index.len() {
                return Err(MatrixError::LengthMismatch {
                    column: name,
                    expected: index.len(),
                    actual: series.len(),
                });
            }
            names.push(name);
            values.push(series);
        }

        Ok(Self {
            index,
            names,
            columns: values,
        })
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    /// Requested names that are not columns, in request order.
    pub fn missing_columns<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        requested
            .iter()
            .map(|s| s.as_ref())
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect()
    }

    /// New matrix with exactly `names`, in that order, sharing the same index.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, MatrixError> {
        let missing = self.missing_columns(names);
        if !missing.is_empty() {
            return Err(MatrixError::MissingColumns(missing));
        }
        let columns = names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                let values = self.column(name).unwrap_or_default().to_vec();
                (name.to_string(), values)
            })
            .collect();
        Self::new(self.index.clone(), columns)
    }

    /// First date on which `name` has a non-missing value.
    pub fn first_valid_date(&self, name: &str) -> Option<NaiveDate> {
        let col = self.column(name)?;
        col.iter()
            .position(|v| !v.is_nan())
            .map(|i| self.index[i])
    }

    /// BLAKE3 over the index, column names and raw value bits.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.index {
            hasher.update(date.to_string().as_bytes());
        }
        for (name, values) in self.columns() {
            hasher.update(name.as_bytes());
            for v in values {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Month-start dates beginning at `start`, one per month.
pub fn monthly_index(start: NaiveDate, months: usize) -> Vec<NaiveDate> {
    (0..months)
        .filter_map(|i| start.checked_add_months(chrono::Months::new(i as u32)))
        .collect()
}
