//! Datasets and batching
//!
//! - [`Batch`]: one (features, targets) pair with a leading batch dimension
//! - [`Dataset`]: finite, indexed access to samples
//! - [`SeriesDataset`]: sliding windows over a univariate series
//! - [`BatchLoader`]: ordered, restartable batch iteration

mod batch;
mod dataset;
mod loader;

pub use batch::Batch;
pub use dataset::{read_series_csv, Dataset, SeriesDataset};
pub use loader::{BatchLoader, Batches};

/// How predictions and targets are compared by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetKind {
    /// Rescale predictions and targets back to raw units before scoring
    #[default]
    TimeSeries,
    /// Score in the model's output space, untouched
    Raw,
}
