//! Built-in regime presets.
//!
//! A preset is a fixed indicator/direction table run through the shared
//! composite z-score (mean of available directed z-scores) and discretised at
//! symmetric thresholds. Adding a regime means adding a table, not code.

use tracing::{info, warn};

use crate::composite::Direction::{Negative, Positive};
use crate::composite::{composite_score, Aggregation, Direction, Term, Thresholds};
use crate::matrix::IndicatorMatrix;

use super::classifier::RegimeClassifier;
use super::{RegimeError, RegimeFrame, RegimeLabels};

pub const DEFAULT_MIN_PERIODS: usize = 24;
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Ex-post recession flag shipped alongside the macro regime for comparison.
pub const NBER_RECESSION: &str = "cycle_nber_recession";

const MACRO: &[(&str, Direction)] = &[
    ("cycle_indpro_yoy", Positive),
    ("cycle_indpro_accel", Positive),
    ("cycle_unemployment_yoy_diff", Negative),
    ("cycle_unemployment_3m_diff", Negative),
    ("mon_yield_curve_level", Positive),
];

const FINANCIAL: &[(&str, Direction)] = &[
    ("vol_vix_zscore_24m", Negative),
    ("vol_implied_vs_realized_6m", Negative),
    ("credit_hy_oas_zscore_24m", Negative),
    ("credit_hy_oas_3m_change", Negative),
    ("credit_riskon_riskoff_mom_6m", Positive),
    ("trend_drawdown", Positive),
];

const LIQUIDITY: &[(&str, Direction)] = &[
    ("mon_real_rate", Negative),
    ("mon_fedfunds_diff_12m", Negative),
    ("mon_yield_curve_level", Positive),
    ("mon_yield_curve_diff_6m", Positive),
    ("infl_cpi_accel_6m", Negative),
    ("infl_breakeven_3m_change", Negative),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RegimePreset {
    name: String,
    description: String,
    indicators: Vec<(String, Direction)>,
    thresholds: Thresholds,
    min_periods: usize,
    labels: RegimeLabels,
    validation_column: Option<String>,
}

impl RegimePreset {
    pub fn new(
        name: &str,
        description: &str,
        indicators: &[(&str, Direction)],
        labels: RegimeLabels,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            indicators: indicators
                .iter()
                .map(|(n, d)| (n.to_string(), *d))
                .collect(),
            thresholds: Thresholds::symmetric(DEFAULT_THRESHOLD),
            min_periods: DEFAULT_MIN_PERIODS,
            labels,
            validation_column: None,
        }
    }

    /// Real-economy cycle: industrial production, employment, yield curve.
    pub fn macro_cycle() -> Self {
        Self::new(
            "macro",
            "Macroeconomic regime: real cycle (industrial production, employment, yield curve). \
             Regimes: expansion / neutral / contraction.",
            MACRO,
            RegimeLabels::new("expansion", "neutral", "contraction"),
        )
        .with_validation_column(NBER_RECESSION)
    }

    /// Financial conditions: volatility, credit, market stress.
    pub fn financial() -> Self {
        Self::new(
            "financial",
            "Financial conditions regime: volatility, credit, market stress. \
             Regimes: risk_on / neutral / risk_off.",
            FINANCIAL,
            RegimeLabels::new("risk_on", "neutral", "risk_off"),
        )
    }

    /// Monetary liquidity: policy and real rates, curve, inflation.
    pub fn liquidity() -> Self {
        Self::new(
            "liquidity",
            "Liquidity / monetary policy regime: interest rates, real rate, inflation. \
             Regimes: accommodative / neutral / restrictive.",
            LIQUIDITY,
            RegimeLabels::new("accommodative", "neutral", "restrictive"),
        )
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::macro_cycle(), Self::financial(), Self::liquidity()]
    }

    pub fn with_thresholds(mut self, upper: f64, lower: f64) -> Self {
        self.thresholds = Thresholds::new(upper, lower);
        self
    }

    pub fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods.max(1);
        self
    }

    pub fn with_validation_column(mut self, column: &str) -> Self {
        self.validation_column = Some(column.to_string());
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    pub fn labels(&self) -> &RegimeLabels {
        &self.labels
    }
}

impl RegimeClassifier for RegimePreset {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn indicators(&self) -> &[(String, Direction)] {
        &self.indicators
    }

    fn classify(&self, matrix: &IndicatorMatrix) -> Result<RegimeFrame, RegimeError> {
        let (used, missing): (Vec<_>, Vec<_>) = self
            .indicators
            .iter()
            .partition(|(name, _)| matrix.has_column(name));
        let missing: Vec<String> = missing.into_iter().map(|(n, _)| n.clone()).collect();

        if !missing.is_empty() {
            warn!(regime = %self.name, missing = ?missing, "indicators missing from matrix");
        }
        if used.is_empty() {
            return Err(RegimeError::NoIndicatorsAvailable {
                classifier: self.name.clone(),
                required: self.indicators.iter().map(|(n, _)| n.clone()).collect(),
            });
        }

        let terms: Vec<Term<'_>> = used
            .iter()
            .filter_map(|(name, dir)| matrix.column(name).map(|c| Term::new(c, *dir)))
            .collect();
        let score = composite_score(&terms, matrix.len(), self.min_periods, Aggregation::Mean);
        let regime = self.thresholds.discretize(&score);

        let validation = self
            .validation_column
            .as_ref()
            .and_then(|c| matrix.column(c).map(|v| (c.clone(), v.to_vec())));

        let frame = RegimeFrame {
            classifier: self.name.clone(),
            index: matrix.index().to_vec(),
            regime,
            score,
            labels: self.labels.clone(),
            used_indicators: used.iter().map(|(n, _)| n.clone()).collect(),
            missing_indicators: missing,
            validation,
        };

        let counts = frame.counts();
        let count = |r: i8| counts.get(&r).copied().unwrap_or(0);
        info!(
            regime = %self.name,
            used = frame.used_indicators.len(),
            required = self.indicators.len(),
            valid_months = frame.valid_count(),
            favorable = count(1),
            neutral = count(0),
            adverse = count(-1),
            "regime classified"
        );
        Ok(frame)
    }
}

/// Union of every built-in preset's indicators, in first-seen order.
pub fn all_preset_indicators() -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in MACRO.iter().chain(FINANCIAL).chain(LIQUIDITY) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
