use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

use super::{tmp_path, DataError};
use crate::matrix::IndicatorMatrix;

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

pub fn read_matrix_parquet(path: &Path) -> Result<IndicatorMatrix, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::parquet(path, format!("read: {e}")))?;

    let dates = df
        .column("date")
        .map_err(|e| DataError::parquet(path, format!("missing 'date' column: {e}")))?
        .date()
        .map_err(|e| DataError::parquet(path, format!("date column type: {e}")))?;

    let mut index = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = dates
            .get(i)
            .ok_or_else(|| DataError::parquet(path, format!("null date at row {i}")))?;
        index.push(epoch() + chrono::Duration::days(days as i64));
    }

    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        if name == "date" {
            continue;
        }
        let as_f64 = column
            .cast(&DataType::Float64)
            .map_err(|e| DataError::parquet(path, format!("column '{name}' is not numeric: {e}")))?;
        let ca = as_f64
            .f64()
            .map_err(|e| DataError::parquet(path, format!("column '{name}': {e}")))?;
        let values: Vec<f64> = (0..ca.len()).map(|i| ca.get(i).unwrap_or(f64::NAN)).collect();
        columns.push((name, values));
    }

    debug!(path = %path.display(), rows = index.len(), columns = columns.len(), "read matrix parquet");
    IndicatorMatrix::new(index, columns).map_err(|e| DataError::matrix(path, e))
}

pub fn write_matrix_parquet(matrix: &IndicatorMatrix, path: &Path) -> Result<(), DataError> {
    let days: Vec<i32> = matrix
        .index()
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();

    let mut columns = vec![Column::new("date".into(), days)
        .cast(&DataType::Date)
        .map_err(|e| DataError::parquet(path, format!("date cast: {e}")))?];
    for (name, values) in matrix.columns() {
        columns.push(Column::new(name.into(), values.to_vec()));
    }
    let mut df = DataFrame::new(columns)
        .map_err(|e| DataError::parquet(path, format!("dataframe creation: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    let file = fs::File::create(&tmp).map_err(|e| DataError::io(&tmp, e))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::parquet(path, format!("write: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        DataError::io(path, e)
    })
}
