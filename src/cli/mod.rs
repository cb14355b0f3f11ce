//! CLI for the evaluation harness
//!
//! Every flag defaults to the fixed evaluation scenario, so invoking the
//! binary with no arguments evaluates the `rescnn` checkpoint against the
//! default dataset with an L1 criterion.

mod logging;

pub use logging::{log, LogLevel};

use crate::checkpoint::load_checkpoint;
use crate::data::{BatchLoader, DatasetKind, SeriesDataset};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::eval::{evaluate, EvalOptions};
use crate::loss::{Criterion, HuberLoss, L1Loss, MSELoss};
use crate::model::ModelRegistry;
use crate::scaler::{Scaler, StandardScaler};
use clap::Parser;
use ndarray::Array2;
use std::path::PathBuf;

/// Evaluate a trained forecasting model against a held-out dataset
#[derive(Parser, Debug)]
#[command(name = "evaluar", version)]
#[command(about = "Evaluate a trained time-series forecasting model")]
pub struct Cli {
    /// Checkpoint file (.json or .safetensors)
    #[arg(long, default_value = "checkpoints/rescnn_epoch2.safetensors")]
    pub checkpoint: PathBuf,

    /// Model type identifier from the registry
    #[arg(long, default_value = "rescnn")]
    pub model_type: String,

    /// CSV file holding the held-out series
    #[arg(long, default_value = "data/train.csv")]
    pub data: PathBuf,

    /// CSV column to read the series from
    #[arg(long, default_value = "close")]
    pub column: String,

    /// Evaluation batch size
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Criterion: l1, mse, or huber
    #[arg(long, default_value = "l1")]
    pub criterion: String,

    /// Enable reduced-precision inference
    #[arg(long)]
    pub amp: bool,

    /// Write per-batch predictions next to the working directory
    #[arg(long)]
    pub save_predictions: bool,

    /// Score in the model's output space instead of rescaled units
    #[arg(long)]
    pub raw: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print extra details
    #[arg(short, long)]
    pub verbose: bool,
}

fn build_criterion(name: &str) -> Result<Box<dyn Criterion>> {
    match name {
        "l1" => Ok(Box::new(L1Loss)),
        "mse" => Ok(Box::new(MSELoss)),
        "huber" => Ok(Box::new(HuberLoss::default())),
        other => Err(Error::Config(format!(
            "Unknown criterion '{other}' (known: l1, mse, huber)"
        ))),
    }
}

/// Run the evaluation scenario described by the parsed CLI
pub fn run_command(cli: Cli) -> Result<()> {
    let level = LogLevel::from_flags(cli.quiet, cli.verbose);

    let registry = ModelRegistry::builtin();
    let mut model = registry.resolve(&cli.model_type)?;

    let checkpoint = load_checkpoint(&cli.checkpoint)?;
    if checkpoint.metadata.model_type != cli.model_type {
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "Checkpoint was saved for '{}', loading into '{}'",
                checkpoint.metadata.model_type, cli.model_type
            ),
        );
    }
    model.load_params(&checkpoint.params)?;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Loaded {} checkpoint from {} (epoch {})",
            model.arch_name(),
            cli.checkpoint.display(),
            checkpoint.metadata.epoch
        ),
    );

    let series = crate::data::read_series_csv(&cli.data, &cli.column)?;
    let scaler = StandardScaler::fit_series(&series);
    let column = Array2::from_shape_vec((series.len(), 1), series)
        .map_err(|e| Error::Data(format!("series reshape failed: {e}")))?;
    let scaled: Vec<f32> = scaler.transform(&column)?.column(0).to_vec();

    let dataset = SeriesDataset::from_series(scaled, model.window(), model.horizon())?;
    let dataset_size = crate::data::Dataset::len(&dataset);
    let loader = BatchLoader::new(dataset, cli.batch_size);
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Evaluating on {} samples ({} batches of {})",
            dataset_size,
            loader.num_batches(),
            cli.batch_size
        ),
    );

    let criterion = build_criterion(&cli.criterion)?;
    let options = EvalOptions {
        device: Device::preferred(),
        batch_size: cli.batch_size,
        dataset_size,
        dataset_kind: if cli.raw {
            DatasetKind::Raw
        } else {
            DatasetKind::TimeSeries
        },
        autocast: cli.amp,
        save_predictions: cli.save_predictions.then(|| PathBuf::from(".")),
        log_interval: if level == LogLevel::Verbose { 10 } else { 0 },
    };

    let val_loss = evaluate(
        model.as_mut(),
        &loader,
        criterion.as_ref(),
        &scaler,
        &options,
    )?;
    println!("Validation loss: {val_loss}");
    Ok(())
}
