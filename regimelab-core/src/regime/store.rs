//! Regime persistence: `regime_<name>.csv` per classifier and
//! `regimes_all.csv` for the combined table. Missing regimes are empty cells.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use super::selector::RegimeTable;
use super::{regime_column, RegimeError, RegimeFrame};
use crate::data::write_atomic;

pub const ALL_REGIMES_FILE: &str = "regimes_all.csv";

#[derive(Debug, Clone)]
pub struct RegimeStore {
    dir: PathBuf,
}

impl RegimeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, classifier: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", regime_column(classifier)))
    }

    pub fn all_path(&self) -> PathBuf {
        self.dir.join(ALL_REGIMES_FILE)
    }

    /// Write one classifier's series as `date,regime_<name>`.
    pub fn save(&self, frame: &RegimeFrame) -> Result<PathBuf, RegimeError> {
        frame.validate(&frame.index)?;
        let path = self.path_for(&frame.classifier);
        let columns = [(frame.column_name(), frame.regime.as_slice())];
        self.write_table(&path, &frame.index, &columns)?;
        info!(regime = %frame.classifier, path = %path.display(), "regime saved");
        Ok(path)
    }

    /// Write every included classifier side by side.
    pub fn save_all(&self, table: &RegimeTable) -> Result<PathBuf, RegimeError> {
        for frame in &table.frames {
            frame.validate(&table.index)?;
        }
        let path = self.all_path();
        let columns: Vec<(String, &[Option<i8>])> = table
            .frames
            .iter()
            .map(|f| (f.column_name(), f.regime.as_slice()))
            .collect();
        self.write_table(&path, &table.index, &columns)?;
        info!(path = %path.display(), regimes = columns.len(), "all regimes saved");
        Ok(path)
    }

    fn write_table(
        &self,
        path: &Path,
        index: &[NaiveDate],
        columns: &[(String, &[Option<i8>])],
    ) -> Result<(), RegimeError> {
        let csv_err = |source| RegimeError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_writer(vec![]);

        let mut header = vec!["date".to_string()];
        header.extend(columns.iter().map(|(name, _)| name.clone()));
        writer.write_record(&header).map_err(csv_err)?;

        for (row, date) in index.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(
                columns
                    .iter()
                    .map(|(_, values)| values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record).map_err(csv_err)?;
        }

        let bytes = writer.into_inner().map_err(|e| RegimeError::Io {
            path: path.to_path_buf(),
            source: e.into_error(),
        })?;
        write_atomic(path, &bytes).map_err(|source| RegimeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read back a saved `regime_<name>.csv`.
    pub fn load(&self, classifier: &str) -> Result<Vec<(NaiveDate, Option<i8>)>, RegimeError> {
        let path = self.path_for(classifier);
        let csv_err = |source| RegimeError::Csv {
            path: path.clone(),
            source,
        };
        let parse_err = |row: usize, reason: String| RegimeError::Parse {
            path: path.clone(),
            row,
            reason,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        let mut out = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let row = i + 1;
            let date = crate::data::parse_date(record.get(0).unwrap_or_default())
                .map_err(|r| parse_err(row, r))?;
            let value = crate::data::parse_cell(record.get(1).unwrap_or_default())
                .map_err(|r| parse_err(row, r))?;
            let regime = if value.is_nan() {
                None
            } else if [-1.0, 0.0, 1.0].contains(&value) {
                Some(value as i8)
            } else {
                return Err(parse_err(row, format!("regime value {value} outside {{-1, 0, 1}}")));
            };
            out.push((date, regime));
        }
        Ok(out)
    }
}
