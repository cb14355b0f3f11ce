//! Mean Squared Error, Mean Absolute Error, and Huber criteria

use ndarray::Array2;

use super::Criterion;

/// Mean Squared Error
///
/// L = mean((predictions - targets)^2)
///
/// # Example
///
/// ```
/// use evaluar::loss::{Criterion, MSELoss};
/// use ndarray::Array2;
///
/// let pred = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
/// let target = Array2::from_shape_vec((1, 3), vec![1.5, 2.5, 3.5]).unwrap();
/// let loss = MSELoss.compute(&pred, &target);
/// assert!((loss - 0.25).abs() < 1e-5);
/// ```
pub struct MSELoss;

impl Criterion for MSELoss {
    fn compute(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
        assert_eq!(
            predictions.dim(),
            targets.dim(),
            "Predictions and targets must have same shape"
        );

        let diff = predictions - targets;
        (&diff * &diff).mean().unwrap_or(0.0)
    }

    fn name(&self) -> &'static str {
        "MSE"
    }
}

/// L1 Loss (Mean Absolute Error)
///
/// L = mean(|predictions - targets|)
///
/// More robust to outliers than MSE.
pub struct L1Loss;

impl Criterion for L1Loss {
    fn compute(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
        assert_eq!(
            predictions.dim(),
            targets.dim(),
            "Predictions and targets must have same shape"
        );

        (predictions - targets).mapv(f32::abs).mean().unwrap_or(0.0)
    }

    fn name(&self) -> &'static str {
        "L1"
    }
}

/// Huber Loss (Smooth L1 Loss)
///
/// Quadratic for small errors, linear for large ones:
///
/// For |error| <= delta:  L = 0.5 * error^2
/// For |error| > delta:   L = delta * (|error| - 0.5 * delta)
pub struct HuberLoss {
    /// Threshold for switching between quadratic and linear
    delta: f32,
}

impl HuberLoss {
    /// Create Huber loss with given delta threshold
    pub fn new(delta: f32) -> Self {
        assert!(delta > 0.0, "delta must be positive");
        Self { delta }
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Criterion for HuberLoss {
    fn compute(&self, predictions: &Array2<f32>, targets: &Array2<f32>) -> f32 {
        assert_eq!(
            predictions.dim(),
            targets.dim(),
            "Predictions and targets must have same shape"
        );

        let delta = self.delta;
        let n = predictions.len().max(1) as f32;
        predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &t)| {
                let abs_d = (p - t).abs();
                if abs_d <= delta {
                    0.5 * abs_d * abs_d
                } else {
                    delta * (abs_d - 0.5 * delta)
                }
            })
            .sum::<f32>()
            / n
    }

    fn name(&self) -> &'static str {
        "Huber"
    }
}

/// Smooth L1 Loss (alias for HuberLoss with delta=1.0)
pub type SmoothL1Loss = HuberLoss;
