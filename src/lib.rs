//! evaluar: evaluation harness for trained time-series forecasting models
//!
//! Loads a checkpoint into a registered model, wraps a held-out series in a
//! batching loader, runs inference batch by batch, optionally rescales
//! predictions back to raw units, and reports the average loss.
//!
//! ## Example
//!
//! ```
//! use evaluar::data::{BatchLoader, Dataset, DatasetKind, SeriesDataset};
//! use evaluar::eval::{evaluate, EvalOptions};
//! use evaluar::loss::L1Loss;
//! use evaluar::model::{LstmConfig, LstmRegressor};
//! use evaluar::scaler::StandardScaler;
//!
//! let series: Vec<f32> = (0..40).map(|i| (i as f32 * 0.3).sin()).collect();
//! let scaler = StandardScaler::fit_series(&series);
//!
//! let mut model = LstmRegressor::new(LstmConfig {
//!     window: 8,
//!     input_size: 1,
//!     hidden_size: 4,
//!     output_size: 1,
//! });
//!
//! let dataset = SeriesDataset::from_series(series, 8, 1).unwrap();
//! let options = EvalOptions {
//!     batch_size: 16,
//!     dataset_size: dataset.len(),
//!     dataset_kind: DatasetKind::TimeSeries,
//!     ..EvalOptions::default()
//! };
//! let loader = BatchLoader::new(dataset, 16);
//!
//! let loss = evaluate(&mut model, &loader, &L1Loss, &scaler, &options).unwrap();
//! assert!(loss.is_finite());
//! ```

pub mod checkpoint;
pub mod cli;
pub mod data;
pub mod device;
pub mod error;
pub mod eval;
pub mod loss;
pub mod model;
pub mod precision;
pub mod scaler;

pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint, CheckpointMetadata};
pub use data::{Batch, BatchLoader, Dataset, DatasetKind, SeriesDataset};
pub use device::Device;
pub use error::{Error, Result};
pub use eval::{evaluate, EvalOptions};
pub use loss::{Criterion, HuberLoss, L1Loss, MSELoss};
pub use model::{Forecaster, Mode, ModeGuard, ModelRegistry, ParamMap};
pub use precision::Precision;
pub use scaler::{MinMaxScaler, Scaler, StandardScaler};
