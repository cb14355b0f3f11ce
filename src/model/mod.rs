//! Forecasting model seam and architectures
//!
//! [`Forecaster`] is the contract the evaluator drives: a callable mapping
//! a feature batch to a prediction batch, with train/eval mode switching,
//! device placement, and parameter loading from a checkpoint snapshot.
//!
//! The architectures live in their own files and share the forward-only
//! layers in [`layers`]; [`registry`] maps string identifiers to lazily
//! invoked factories.

pub mod layers;
pub mod lstm;
pub mod registry;
pub mod rescnn;
pub mod s4;
pub mod transformer;

pub use layers::ParamMap;
pub use lstm::{LstmConfig, LstmRegressor};
pub use registry::ModelRegistry;
pub use rescnn::{ResCnn, ResCnnConfig};
pub use s4::{StateSpace, StateSpaceConfig};
pub use transformer::{TransformerConfig, TransformerForecaster};

use crate::device::Device;
use crate::error::Result;
use ndarray::Array2;

/// Execution mode of a model
///
/// Evaluation mode disables training-only stochastic behaviors (dropout)
/// and leaves the forward pass deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Training mode: stochastic regularization active
    #[default]
    Train,
    /// Evaluation mode: deterministic forward pass
    Eval,
}

/// A trained forecasting model the evaluator can drive
pub trait Forecaster: std::fmt::Debug {
    /// Stable architecture name, used for the prediction output directory
    fn arch_name(&self) -> &'static str;

    /// Expected feature width (input window length)
    fn window(&self) -> usize;

    /// Produced prediction width (forecast horizon)
    fn horizon(&self) -> usize;

    /// Current execution mode
    fn mode(&self) -> Mode;

    /// Switch execution mode
    fn set_mode(&mut self, mode: Mode);

    /// Current device placement
    fn device(&self) -> Device;

    /// Place the model on a device
    fn place_on(&mut self, device: Device);

    /// Map a feature batch `[batch, window]` to predictions `[batch, horizon]`
    fn forward(&self, features: &Array2<f32>) -> Result<Array2<f32>>;

    /// Load parameters from a checkpoint snapshot
    ///
    /// Fails on missing keys or wrong element counts; partially applied
    /// loads are not rolled back.
    fn load_params(&mut self, params: &ParamMap) -> Result<()>;

    /// Export parameters into a checkpoint snapshot
    fn export_params(&self) -> ParamMap;
}

/// Scoped switch into evaluation mode
///
/// Records the model's mode on entry, switches to [`Mode::Eval`], and
/// restores the recorded mode when dropped — on every exit path, including
/// early returns from errors.
pub struct ModeGuard<'a> {
    model: &'a mut dyn Forecaster,
    prior: Mode,
}

impl<'a> ModeGuard<'a> {
    /// Enter evaluation mode on `model`
    pub fn enter(model: &'a mut dyn Forecaster) -> Self {
        let prior = model.mode();
        model.set_mode(Mode::Eval);
        Self { model, prior }
    }

    /// The guarded model
    pub fn model(&self) -> &dyn Forecaster {
        &*self.model
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.model.set_mode(self.prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Stub {
        mode: Mode,
        device: Device,
    }

    impl Forecaster for Stub {
        fn arch_name(&self) -> &'static str {
            "Stub"
        }
        fn window(&self) -> usize {
            4
        }
        fn horizon(&self) -> usize {
            1
        }
        fn mode(&self) -> Mode {
            self.mode
        }
        fn set_mode(&mut self, mode: Mode) {
            self.mode = mode;
        }
        fn device(&self) -> Device {
            self.device
        }
        fn place_on(&mut self, device: Device) {
            self.device = device;
        }
        fn forward(&self, features: &Array2<f32>) -> Result<Array2<f32>> {
            Ok(features.clone())
        }
        fn load_params(&mut self, _params: &ParamMap) -> Result<()> {
            Ok(())
        }
        fn export_params(&self) -> ParamMap {
            ParamMap::new()
        }
    }

    #[test]
    fn test_guard_switches_to_eval() {
        let mut model = Stub {
            mode: Mode::Train,
            device: Device::Cpu,
        };
        {
            let guard = ModeGuard::enter(&mut model);
            assert_eq!(guard.model().mode(), Mode::Eval);
        }
        assert_eq!(model.mode(), Mode::Train);
    }

    #[test]
    fn test_guard_restores_prior_eval_mode() {
        let mut model = Stub {
            mode: Mode::Eval,
            device: Device::Cpu,
        };
        {
            let _guard = ModeGuard::enter(&mut model);
        }
        assert_eq!(model.mode(), Mode::Eval);
    }

    #[test]
    fn test_guard_restores_on_unwind() {
        let mut model = Stub {
            mode: Mode::Train,
            device: Device::Cpu,
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ModeGuard::enter(&mut model);
            panic!("mid-loop failure");
        }));
        assert!(result.is_err());
        assert_eq!(model.mode(), Mode::Train);
    }

    #[test]
    fn test_default_mode_is_train() {
        assert_eq!(Mode::default(), Mode::Train);
    }
}
