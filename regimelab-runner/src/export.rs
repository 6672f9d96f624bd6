//! CSV export of signal tables and regime detail.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use regimelab_core::model::SignalSeries;
use regimelab_core::regime::RegimeFrame;

/// Several models' signals over one matrix index.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    index: Vec<NaiveDate>,
    columns: Vec<(String, SignalSeries)>,
    /// BLAKE3 of the matrix the signals were computed from.
    dataset_hash: String,
}

impl SignalTable {
    pub fn new(index: Vec<NaiveDate>, dataset_hash: impl Into<String>) -> Self {
        Self {
            index,
            columns: Vec::new(),
            dataset_hash: dataset_hash.into(),
        }
    }

    /// Add a model's signal. It must share the table's index.
    pub fn push(&mut self, model: &str, signal: SignalSeries) -> Result<(), String> {
        if signal.index() != self.index.as_slice() {
            return Err(format!("signal for '{model}' is not aligned to the table index"));
        }
        if self.columns.iter().any(|(name, _)| name == model) {
            return Err(format!("duplicate model column '{model}'"));
        }
        self.columns.push((model.to_string(), signal));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn signal(&self, model: &str) -> Option<&SignalSeries> {
        self.columns
            .iter()
            .find(|(n, _)| n == model)
            .map(|(_, s)| s)
    }

    pub fn dataset_hash(&self) -> &str {
        &self.dataset_hash
    }

    /// BLAKE3 over the dataset hash and every column, identifying this exact
    /// set of signals.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.as_bytes());
        for (name, signal) in &self.columns {
            hasher.update(name.as_bytes());
            for v in signal.as_i8() {
                hasher.update(&[v.map_or(u8::MAX, |x| x as u8)]);
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Columns: `date,<model_1>,<model_2>,…`; missing signals are empty cells.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        let mut header = vec!["date".to_string()];
        header.extend(self.models().map(str::to_string));
        wtr.write_record(&header)?;

        for (row, date) in self.index.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            for (_, signal) in &self.columns {
                record.push(
                    signal
                        .get(row)
                        .map(|d| d.as_i8().to_string())
                        .unwrap_or_default(),
                );
            }
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let csv = self.to_csv()?;
        regimelab_core::data::write_atomic(path, csv.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// One regime in detail: `date,regime,label,score[,<validation column>]`.
pub fn export_regime_detail_csv(frame: &RegimeFrame) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![
        "date".to_string(),
        frame.column_name(),
        "label".to_string(),
        "score".to_string(),
    ];
    if let Some((name, _)) = &frame.validation {
        header.push(name.clone());
    }
    wtr.write_record(&header)?;

    for (row, date) in frame.index.iter().enumerate() {
        let mut record = vec![
            date.format("%Y-%m-%d").to_string(),
            frame.regime[row].map(|r| r.to_string()).unwrap_or_default(),
            frame.label_at(row).unwrap_or_default().to_string(),
            finite_or_empty(frame.score[row]),
        ];
        if let Some((_, values)) = &frame.validation {
            record.push(finite_or_empty(values[row]));
        }
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn finite_or_empty(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimelab_core::matrix::monthly_index;
    use regimelab_core::regime::RegimeLabels;

    fn index() -> Vec<NaiveDate> {
        monthly_index(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(), 3)
    }

    #[test]
    fn signal_table_csv() {
        let mut table = SignalTable::new(index(), "abc");
        table
            .push("m1", SignalSeries::from_raw(&index(), &[None, Some(1), Some(-1)]).unwrap())
            .unwrap();
        table
            .push("m2", SignalSeries::from_raw(&index(), &[Some(0), Some(0), None]).unwrap())
            .unwrap();
        assert_eq!(
            table.to_csv().unwrap(),
            "date,m1,m2\n2022-01-01,,0\n2022-02-01,1,0\n2022-03-01,-1,\n"
        );
    }

    #[test]
    fn rejects_misaligned_or_duplicate_columns() {
        let mut table = SignalTable::new(index(), "abc");
        let short = SignalSeries::from_raw(&index()[..2], &[None, None]).unwrap();
        assert!(table.push("short", short).is_err());

        let ok = SignalSeries::from_raw(&index(), &[None, None, None]).unwrap();
        table.push("m", ok.clone()).unwrap();
        assert!(table.push("m", ok).is_err());
    }

    #[test]
    fn content_hash_tracks_values() {
        let mut a = SignalTable::new(index(), "abc");
        a.push("m", SignalSeries::from_raw(&index(), &[None, Some(1), Some(1)]).unwrap())
            .unwrap();
        let mut b = SignalTable::new(index(), "abc");
        b.push("m", SignalSeries::from_raw(&index(), &[None, Some(1), Some(0)]).unwrap())
            .unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), a.clone().content_hash());
    }

    #[test]
    fn regime_detail_includes_validation_column() {
        let frame = RegimeFrame {
            classifier: "macro".into(),
            index: index(),
            regime: vec![None, Some(1), Some(-1)],
            score: vec![f64::NAN, 0.75, -0.6],
            labels: RegimeLabels::new("expansion", "neutral", "contraction"),
            used_indicators: vec![],
            missing_indicators: vec![],
            validation: Some(("cycle_nber_recession".into(), vec![0.0, 0.0, 1.0])),
        };
        let csv = export_regime_detail_csv(&frame).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,regime_macro,label,score,cycle_nber_recession");
        assert_eq!(lines[1], "2022-01-01,,,,0.000000");
        assert_eq!(lines[2], "2022-02-01,1,expansion,0.750000,0.000000");
        assert_eq!(lines[3], "2022-03-01,-1,contraction,-0.600000,1.000000");
    }
}
