use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use super::{write_atomic, DataError};
use crate::matrix::IndicatorMatrix;

const MISSING_MARKERS: [&str; 4] = ["", "nan", "na", "null"];

/// Parse a missing-aware float cell.
pub(crate) fn parse_cell(cell: &str) -> Result<f64, String> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell.to_ascii_lowercase().as_str()) {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| format!("'{cell}' is not a number: {e}"))
}

/// Parse `YYYY-MM-DD`, ignoring a trailing time part.
pub(crate) fn parse_date(cell: &str) -> Result<NaiveDate, String> {
    let day = cell.trim().split(['T', ' ']).next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("bad date '{cell}': {e}"))
}

pub fn read_matrix_csv(path: &Path) -> Result<IndicatorMatrix, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| DataError::csv(path, e))?.clone();
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::csv(path, e))?;
        let parse_err = |column: &str, reason: String| DataError::Parse {
            path: path.to_path_buf(),
            row: row + 1,
            column: column.to_string(),
            reason,
        };

        let date = parse_date(record.get(0).unwrap_or_default())
            .map_err(|r| parse_err(headers.get(0).unwrap_or("date"), r))?;
        index.push(date);
        for (i, name) in names.iter().enumerate() {
            let value =
                parse_cell(record.get(i + 1).unwrap_or_default()).map_err(|r| parse_err(name, r))?;
            columns[i].push(value);
        }
    }

    debug!(path = %path.display(), rows = index.len(), columns = names.len(), "read matrix csv");
    IndicatorMatrix::new(index, names.into_iter().zip(columns).collect())
        .map_err(|e| DataError::matrix(path, e))
}

pub fn write_matrix_csv(matrix: &IndicatorMatrix, path: &Path) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(matrix.column_names().iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| DataError::csv(path, e))?;

    for (row, date) in matrix.index().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(matrix.columns().map(|(_, values)| format_cell(values[row])));
        writer
            .write_record(&record)
            .map_err(|e| DataError::csv(path, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DataError::io(path, e.into_error()))?;
    write_atomic(path, &bytes).map_err(|e| DataError::io(path, e))
}

/// Missing values are written as empty cells.
pub(crate) fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
