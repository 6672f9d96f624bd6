//! RegimeLab Core: causal statistics, decision models and regime classifiers.
//!
//! This crate turns a monthly indicator matrix into discrete series:
//! - Causal (expanding / trailing) statistics with no look-ahead
//! - A shared composite z-score used by both models and regimes
//! - Decision models: definition + pluggable logic behind one validated
//!   `generate_signal` entry point
//! - Logic registry, factory, JSON model store and loader
//! - Regime presets (macro, financial, liquidity), selector and CSV store
//! - Matrix I/O (CSV, Parquet), indicator catalog, synthetic data

pub mod catalog;
pub mod composite;
pub mod data;
pub mod matrix;
pub mod model;
pub mod regime;
pub mod stats;

pub use catalog::{IndicatorCatalog, IndicatorMeta};
pub use matrix::{IndicatorMatrix, MatrixError};
pub use model::{
    create_model, load_all_models, load_model, CreateOptions, Decision, DecisionModel,
    LogicRegistry, ModelDefinition, ModelError, ModelRequest, ModelStore, SignalSeries,
};
pub use regime::{RegimeClassifier, RegimeError, RegimeFrame, RegimePreset, RegimeSelector};
