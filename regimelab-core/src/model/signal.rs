//! Discrete tactical signals.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One tactical decision. The model acts as if it controlled its whole sleeve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// -1: reduce exposure (defensive).
    Reduce,
    /// 0: keep exposure.
    Hold,
    /// +1: increase exposure (aggressive).
    Increase,
}

impl Decision {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Reduce => -1,
            Self::Hold => 0,
            Self::Increase => 1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::Reduce),
            0 => Some(Self::Hold),
            1 => Some(Self::Increase),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reduce => "reduce",
            Self::Hold => "hold",
            Self::Increase => "increase",
        }
    }
}

/// A validated signal aligned to the index of the matrix it was computed from.
/// `None` marks rows where the underlying statistic is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    index: Vec<NaiveDate>,
    values: Vec<Option<Decision>>,
}

impl SignalSeries {
    /// Validate raw logic output against `index`.
    ///
    /// Fails with a human-readable reason when the length differs from the
    /// index or any value is outside {-1, 0, 1}.
    pub fn from_raw(index: &[NaiveDate], raw: &[Option<i8>]) -> Result<Self, String> {
        if raw.len() != index.len() {
            return Err(format!(
                "signal has {} rows but the matrix index has {}",
                raw.len(),
                index.len()
            ));
        }

        let mut values = Vec::with_capacity(raw.len());
        let mut invalid = Vec::new();
        for (i, v) in raw.iter().enumerate() {
            match v {
                None => values.push(None),
                Some(x) => match Decision::from_i8(*x) {
                    Some(d) => values.push(Some(d)),
                    None => invalid.push(format!("{}={x}", index[i])),
                },
            }
        }
        if !invalid.is_empty() {
            return Err(format!(
                "values outside {{-1, 0, 1}}: {}",
                invalid.join(", ")
            ));
        }

        Ok(Self {
            index: index.to_vec(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[Option<Decision>] {
        &self.values
    }

    pub fn get(&self, i: usize) -> Option<Decision> {
        self.values.get(i).copied().flatten()
    }

    pub fn as_i8(&self) -> Vec<Option<i8>> {
        self.values.iter().map(|v| v.map(Decision::as_i8)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<Decision>)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Rows with a defined decision.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// How many rows carry each decision.
    pub fn counts(&self) -> BTreeMap<Decision, usize> {
        let mut counts = BTreeMap::new();
        for d in self.values.iter().flatten() {
            *counts.entry(*d).or_insert(0) += 1;
        }
        counts
    }
}
