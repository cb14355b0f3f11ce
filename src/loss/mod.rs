//! Loss criteria for evaluation
//!
//! This module provides the criteria used to score predictions against
//! targets:
//!
//! - [`L1Loss`] - Mean Absolute Error (robust to outliers)
//! - [`MSELoss`] - Mean Squared Error
//! - [`HuberLoss`] / [`SmoothL1Loss`] - Smooth combination of MSE and L1

mod mse;
mod traits;

pub use mse::{HuberLoss, L1Loss, MSELoss, SmoothL1Loss};
pub use traits::Criterion;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_names() {
        assert_eq!(L1Loss.name(), "L1");
        assert_eq!(MSELoss.name(), "MSE");
        assert_eq!(HuberLoss::new(1.0).name(), "Huber");
    }
}
