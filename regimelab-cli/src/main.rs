//! RegimeLab CLI: decision models, regime classification and data tooling.
//!
//! Commands:
//! - `models list|show|create|signal`: manage saved models and run them
//! - `regime list|run|all`: classify the indicator matrix into regimes
//! - `catalog`: show the indicator catalog the factory validates against
//! - `synth`: write a deterministic synthetic indicator matrix

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use regimelab_core::data::{save_matrix, synthetic_matrix, SyntheticSpec};
use regimelab_core::model::ModelRequest;
use regimelab_core::regime::{RegimeFrame, RegimeTable};
use regimelab_runner::{export_regime_detail_csv, RegimelabConfig, Workspace};

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: tactical signals and regime classification"
)]
struct Cli {
    /// Path to regimelab.toml. Defaults to ./regimelab.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Saved decision models.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Regime classifiers.
    Regime {
        #[command(subcommand)]
        action: RegimeAction,
    },
    /// Show the indicator catalog.
    Catalog,
    /// Write a synthetic indicator matrix covering every preset indicator.
    Synth {
        /// Output file (.csv or .parquet).
        #[arg(long)]
        out: PathBuf,

        /// Number of monthly rows.
        #[arg(long, default_value_t = 240)]
        months: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Leading missing months on every other column.
        #[arg(long, default_value_t = 0)]
        staggered: usize,
    },
}

#[derive(Subcommand)]
enum ModelsAction {
    /// List saved models.
    List,
    /// Print a saved model's definition.
    Show { name: String },
    /// Create a model from a JSON request file.
    Create {
        /// JSON with name, indicators, logic_type, parameters, description.
        #[arg(long)]
        file: PathBuf,

        /// Skip the indicator catalog check.
        #[arg(long, default_value_t = false)]
        no_validate: bool,

        /// Save the model to the models directory.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Associate the saved model with a regime.
        #[arg(long)]
        regime: Option<String>,
    },
    /// Generate signals. With no names, every saved model is run.
    Signal {
        names: Vec<String>,

        /// Write the signal table as CSV here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RegimeAction {
    /// List registered regime classifiers.
    List,
    /// Run one classifier.
    Run {
        name: String,

        /// Persist regime_<name>.csv to the regimes directory.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Also write a detail CSV (label, score, validation column).
        #[arg(long)]
        detail: Option<PathBuf>,
    },
    /// Run every classifier and report pairwise agreement.
    All {
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let workspace = || -> Result<Workspace> {
        let config = RegimelabConfig::load(cli.config.as_deref())?;
        info!(
            indicators = %config.paths.indicators.display(),
            models = %config.paths.models_dir.display(),
            regimes = %config.paths.regimes_dir.display(),
            "workspace configured"
        );
        Ok(Workspace::new(config))
    };

    match cli.command {
        Commands::Models { action } => run_models_cmd(&mut workspace()?, action),
        Commands::Regime { action } => run_regime_cmd(&mut workspace()?, action),
        Commands::Catalog => run_catalog(&mut workspace()?),
        Commands::Synth {
            out,
            months,
            seed,
            staggered,
        } => run_synth(out, months, seed, staggered),
    }
}

/// Logs go to stderr so stdout stays clean for CSV output.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn run_models_cmd(ws: &mut Workspace, action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            let names = ws.list_models()?;
            if names.is_empty() {
                println!(
                    "No saved models in {}",
                    ws.model_store().dir().display()
                );
                return Ok(());
            }
            let report = ws.load_all_models()?;
            info!(
                loaded = report.models.len(),
                failed = report.failures.len(),
                "models listed"
            );
            println!("{:<28} {:<20} {:<12} {}", "Model", "Logic", "Indicators", "Regime");
            println!("{}", "-".repeat(72));
            for model in &report.models {
                println!(
                    "{:<28} {:<20} {:<12} {}",
                    model.name(),
                    model.logic_type(),
                    model.indicators().len(),
                    model.definition().associated_regime().unwrap_or("-")
                );
            }
            for failure in &report.failures {
                println!("{:<28} FAILED: {}", failure.name, failure.error);
            }
            Ok(())
        }
        ModelsAction::Show { name } => {
            let model = ws.load_model(&name)?;
            println!("{}", serde_json::to_string_pretty(&model.to_record())?);
            println!("fingerprint: {}", model.fingerprint());
            Ok(())
        }
        ModelsAction::Create {
            file,
            no_validate,
            save,
            regime,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request: ModelRequest = serde_json::from_str(&content)
                .with_context(|| format!("invalid model request in {}", file.display()))?;
            let model = ws.create_model(request, !no_validate, save, regime.as_deref())?;
            info!(model = model.name(), saved = save, "model created");
            println!(
                "Created model '{}' ({}, {} indicators)",
                model.name(),
                model.logic_type(),
                model.indicators().len()
            );
            if save {
                println!(
                    "Saved to: {}",
                    ws.model_store().path_for(model.name()).display()
                );
            }
            Ok(())
        }
        ModelsAction::Signal { names, output } => {
            let table = ws.run_models(&names)?;
            if table.is_empty() {
                bail!("no models to run");
            }
            info!(
                models = table.models().count(),
                rows = table.index().len(),
                "signals generated"
            );
            match output {
                Some(path) => {
                    table.write_csv(&path)?;
                    info!(path = %path.display(), hash = %table.content_hash(), "signal table written");
                    println!("Signals written to: {}", path.display());
                    println!("Content hash: {}", table.content_hash());
                }
                None => print!("{}", table.to_csv()?),
            }
            Ok(())
        }
    }
}

fn run_regime_cmd(ws: &mut Workspace, action: RegimeAction) -> Result<()> {
    match action {
        RegimeAction::List => {
            for (name, description) in ws.selector().describe() {
                println!("{name:<12} {description}");
            }
            Ok(())
        }
        RegimeAction::Run { name, save, detail } => {
            let frame = ws.get_regime(&name, save)?;
            print_regime(&frame);
            if save {
                println!(
                    "Saved to: {}",
                    ws.regime_store().path_for(&frame.classifier).display()
                );
            }
            if let Some(path) = detail {
                let csv = export_regime_detail_csv(&frame)?;
                regimelab_core::data::write_atomic(&path, csv.as_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(regime = %frame.classifier, path = %path.display(), "regime detail written");
                println!("Detail written to: {}", path.display());
            }
            Ok(())
        }
        RegimeAction::All { save } => {
            let table = ws.get_all_regimes(save)?;
            print_regime_table(&table);
            if save {
                println!("Saved to: {}", ws.regime_store().dir().display());
            }
            if table.frames.is_empty() {
                bail!("every regime classifier failed");
            }
            if !table.failures.is_empty() {
                warn!(
                    included = table.frames.len(),
                    excluded = table.failures.len(),
                    "some regime classifiers were excluded"
                );
            }
            Ok(())
        }
    }
}

fn run_catalog(ws: &mut Workspace) -> Result<()> {
    let catalog = ws.catalog()?;
    if catalog.is_empty() {
        warn!("indicator catalog is empty, indicator checks are disabled");
        println!("Indicator catalog is empty (indicator checks are disabled).");
        return Ok(());
    }
    println!("Indicators: {}", catalog.len());
    for (category, count) in catalog.categories() {
        let category = if category.is_empty() { "(uncategorised)" } else { category };
        println!("  {category:<24} {count}");
    }
    println!();
    println!("{:<36} {:<16} {:<10} {}", "Indicator", "Category", "Lag", "Description");
    println!("{}", "-".repeat(90));
    for meta in catalog.entries() {
        println!(
            "{:<36} {:<16} {:<10} {}",
            meta.indicator, meta.category, meta.natural_lag, meta.description
        );
    }
    Ok(())
}

fn run_synth(out: PathBuf, months: usize, seed: u64, staggered: usize) -> Result<()> {
    if months == 0 {
        bail!("--months must be at least 1");
    }
    let mut spec = SyntheticSpec::with_preset_columns(months, seed);
    spec.staggered_start = staggered;
    let matrix = synthetic_matrix(&spec)?;
    save_matrix(&matrix, &out)?;
    info!(path = %out.display(), months, seed, staggered, "synthetic matrix written");
    println!(
        "Wrote {} rows x {} indicators to {}",
        matrix.len(),
        matrix.n_columns(),
        out.display()
    );
    println!("Dataset hash: {}", matrix.dataset_hash());
    Ok(())
}

fn print_regime(frame: &RegimeFrame) {
    println!();
    println!("=== Regime: {} ===", frame.classifier);
    println!("Months:     {} ({} classified)", frame.len(), frame.valid_count());
    println!("Indicators: {}", frame.used_indicators.join(", "));
    if !frame.missing_indicators.is_empty() {
        println!("Missing:    {}", frame.missing_indicators.join(", "));
    }
    let counts = frame.counts();
    for value in [1i8, 0, -1] {
        let n = counts.get(&value).copied().unwrap_or(0);
        println!("  {:>2} {:<14} {n}", value, frame.labels.label(value));
    }
    if let Some(last) = (0..frame.len()).rev().find(|&i| frame.regime[i].is_some()) {
        println!(
            "Latest:     {} {}",
            frame.index[last],
            frame.label_at(last).unwrap_or("-")
        );
    }
}

fn print_regime_table(table: &RegimeTable) {
    for frame in &table.frames {
        print_regime(frame);
    }
    for (name, error) in &table.failures {
        println!();
        println!("WARNING: regime '{name}' excluded: {error}");
    }
    if !table.agreement.is_empty() {
        println!();
        println!("--- Agreement ({} complete months) ---", table.complete_rows().len());
        for a in &table.agreement {
            println!("{:<12} {:<12} {:.1}%", a.left, a.right, a.rate * 100.0);
        }
    }
    println!();
}
