//! Ordered batch iteration over a dataset

use super::{Batch, Dataset};
use ndarray::Array2;

/// Produces an ordered, finite, restartable sequence of batches
///
/// Samples are visited in dataset order without shuffling; the final batch
/// holds the remainder when the dataset size is not a multiple of the batch
/// size. Each call to [`BatchLoader::iter`] restarts from the beginning.
pub struct BatchLoader<D: Dataset> {
    dataset: D,
    batch_size: usize,
}

impl<D: Dataset> BatchLoader<D> {
    /// Create a loader with the given batch size
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn new(dataset: D, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            dataset,
            batch_size,
        }
    }

    /// The configured batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of samples in the underlying dataset
    pub fn dataset_size(&self) -> usize {
        self.dataset.len()
    }

    /// Number of batches one pass will yield (remainder included)
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Start a fresh pass over the dataset
    pub fn iter(&self) -> Batches<'_, D> {
        Batches {
            loader: self,
            position: 0,
        }
    }
}

/// Iterator state for one pass of a [`BatchLoader`]
pub struct Batches<'a, D: Dataset> {
    loader: &'a BatchLoader<D>,
    position: usize,
}

impl<D: Dataset> Iterator for Batches<'_, D> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let dataset = &self.loader.dataset;
        let total = dataset.len();
        if self.position >= total {
            return None;
        }

        let end = (self.position + self.loader.batch_size).min(total);
        let rows = end - self.position;
        let mut features = Array2::zeros((rows, dataset.feature_width()));
        let mut targets = Array2::zeros((rows, dataset.target_width()));

        for (row, index) in (self.position..end).enumerate() {
            let (f, t) = dataset.sample(index);
            features.row_mut(row).assign(&f);
            targets.row_mut(row).assign(&t);
        }

        self.position = end;
        Some(Batch::new(features, targets))
    }
}

impl<'a, D: Dataset> IntoIterator for &'a BatchLoader<D> {
    type Item = Batch;
    type IntoIter = Batches<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
