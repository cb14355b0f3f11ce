//! Batch data structure

use ndarray::Array2;

/// An evaluation batch containing features and targets
///
/// Both arrays share the leading (batch) dimension; the final batch of a
/// dataset may be shorter than the configured batch size.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Input features, one row per sample
    pub features: Array2<f32>,
    /// Target values, one row per sample
    pub targets: Array2<f32>,
}

impl Batch {
    /// Create a new batch
    ///
    /// # Panics
    ///
    /// Panics if features and targets disagree on the batch dimension.
    pub fn new(features: Array2<f32>, targets: Array2<f32>) -> Self {
        assert_eq!(
            features.nrows(),
            targets.nrows(),
            "Features and targets must have same batch dimension"
        );
        Self { features, targets }
    }

    /// Number of samples in the batch
    pub fn size(&self) -> usize {
        self.features.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_creation() {
        let features = Array2::zeros((3, 8));
        let targets = Array2::zeros((3, 1));
        let batch = Batch::new(features, targets);
        assert_eq!(batch.size(), 3);
    }

    #[test]
    #[should_panic(expected = "same batch dimension")]
    fn test_batch_dimension_mismatch() {
        Batch::new(Array2::zeros((3, 8)), Array2::zeros((2, 1)));
    }
}
