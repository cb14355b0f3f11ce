//! The batch-by-batch evaluation loop

use crate::data::{Batch, DatasetKind};
use crate::device::Device;
use crate::error::Result;
use crate::loss::Criterion;
use crate::model::{Forecaster, ModeGuard};
use crate::precision::Precision;
use crate::scaler::Scaler;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Options controlling one evaluation pass
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Device the model is placed on before the loop
    pub device: Device,
    /// Batch size the loader was configured with
    pub batch_size: usize,
    /// Held-out dataset size; with `batch_size` it fixes the averaging
    /// denominator independent of how many batches the loader yields
    pub dataset_size: usize,
    /// Whether predictions are rescaled before scoring
    pub dataset_kind: DatasetKind,
    /// Run the loop under the device's reduced-precision policy
    pub autocast: bool,
    /// When set, write per-batch predictions under
    /// `<root>/predictions_<ArchName>/`
    pub save_predictions: Option<PathBuf>,
    /// Print a progress line every N batches; 0 disables
    pub log_interval: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            device: Device::preferred(),
            batch_size: 128,
            dataset_size: 0,
            dataset_kind: DatasetKind::TimeSeries,
            autocast: false,
            save_predictions: None,
            log_interval: 0,
        }
    }
}

/// Writes one CSV file per batch into the prediction directory
struct PredictionSink {
    dir: PathBuf,
}

impl PredictionSink {
    fn create(root: &Path, arch_name: &str) -> Result<Self> {
        let dir = root.join(format!("predictions_{arch_name}"));
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn write_batch(
        &mut self,
        index: usize,
        predictions: &Array2<f32>,
        targets: &Array2<f32>,
    ) -> Result<()> {
        let path = self.dir.join(format!("batch_{index:04}.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| crate::error::Error::Data(format!("{}: {e}", path.display())))?;

        for (pred_row, target_row) in predictions.rows().into_iter().zip(targets.rows()) {
            let record: Vec<String> = pred_row
                .iter()
                .chain(target_row.iter())
                .map(|v| v.to_string())
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| crate::error::Error::Data(format!("{}: {e}", path.display())))?;
        }
        writer
            .flush()
            .map_err(|e| crate::error::Error::Data(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

/// Evaluate a model over a pass of batches, returning the average loss
///
/// The averaging denominator is `max(dataset_size / batch_size, 1)`
/// regardless of the number of batches the pass actually yields. The model
/// is switched to evaluation mode for the duration and its prior mode is
/// restored on every exit path.
///
/// With [`DatasetKind::TimeSeries`], predictions and targets are pushed
/// through the scaler's inverse transform independently before scoring;
/// [`DatasetKind::Raw`] scores them untouched.
///
/// # Panics
///
/// Panics if `options.batch_size` is zero.
pub fn evaluate<I>(
    model: &mut dyn Forecaster,
    batches: I,
    criterion: &dyn Criterion,
    scaler: &dyn Scaler,
    options: &EvalOptions,
) -> Result<f32>
where
    I: IntoIterator<Item = Batch>,
{
    assert!(options.batch_size > 0, "batch_size must be positive");
    let num_batches = (options.dataset_size / options.batch_size).max(1);

    let precision = if options.autocast {
        options.device.autocast_precision()
    } else {
        Precision::Fp32
    };

    let mut sink = match &options.save_predictions {
        Some(root) => Some(PredictionSink::create(root, model.arch_name())?),
        None => None,
    };

    model.place_on(options.device);
    let guard = ModeGuard::enter(model);

    let mut total_loss = 0.0f64;
    for (i, batch) in batches.into_iter().enumerate() {
        let Batch {
            mut features,
            targets,
        } = batch;

        precision.quantize(&mut features);
        let mut prediction = guard.model().forward(&features)?;
        precision.quantize(&mut prediction);

        let (prediction, targets) = match options.dataset_kind {
            DatasetKind::TimeSeries => (
                scaler.inverse_transform(&prediction)?,
                scaler.inverse_transform(&targets)?,
            ),
            DatasetKind::Raw => (prediction, targets),
        };

        let loss = criterion.compute(&prediction, &targets);
        total_loss += f64::from(loss);

        if let Some(sink) = sink.as_mut() {
            sink.write_batch(i, &prediction, &targets)?;
        }
        if options.log_interval > 0 && (i + 1) % options.log_interval == 0 {
            println!(
                "Validation batch {}/{}: {}={loss:.4}",
                i + 1,
                num_batches,
                criterion.name()
            );
        }
    }

    Ok((total_loss / num_batches as f64) as f32)
}
