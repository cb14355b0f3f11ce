//! Criterion trait

use ndarray::Array2;

/// A binary function scoring a prediction batch against its targets
pub trait Criterion {
    /// Compute the scalar loss for one batch
    fn compute(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> f32;

    /// Name of the criterion
    fn name(&self) -> &str;
}
