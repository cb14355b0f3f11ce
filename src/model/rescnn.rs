//! Residual convolutional forecaster

use super::layers::{relu_3d, Conv1d, Linear, ParamMap};
use super::{Forecaster, Mode};
use crate::device::Device;
use crate::error::{Error, Result};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

const INIT_SEED: u64 = 0x7e5c;

/// Configuration for [`ResCnn`]
#[derive(Debug, Clone)]
pub struct ResCnnConfig {
    /// Input window length
    pub window: usize,
    /// Forecast horizon
    pub horizon: usize,
    /// Convolution channel width
    pub channels: usize,
    /// Number of residual blocks
    pub blocks: usize,
    /// Kernel size (odd)
    pub kernel: usize,
}

impl ResCnnConfig {
    /// Next-step forecasting over a short window
    pub fn univariate() -> Self {
        Self {
            window: 30,
            horizon: 1,
            channels: 32,
            blocks: 3,
            kernel: 3,
        }
    }

    /// Whole-series forecasting (window-sized output)
    pub fn target_series() -> Self {
        Self {
            window: 200,
            horizon: 200,
            channels: 32,
            blocks: 3,
            kernel: 3,
        }
    }
}

/// Residual 1-D CNN: stem convolution, residual blocks, pooled linear head
#[derive(Debug)]
pub struct ResCnn {
    config: ResCnnConfig,
    stem: Conv1d,
    blocks: Vec<Conv1d>,
    head: Linear,
    mode: Mode,
    device: Device,
}

impl ResCnn {
    /// Build with freshly initialized weights
    pub fn new(config: ResCnnConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let stem = Conv1d::new(1, config.channels, config.kernel, &mut rng);
        let blocks = (0..config.blocks)
            .map(|_| Conv1d::new(config.channels, config.channels, config.kernel, &mut rng))
            .collect();
        let head = Linear::new(config.channels, config.horizon, &mut rng);
        Self {
            config,
            stem,
            blocks,
            head,
            mode: Mode::default(),
            device: Device::default(),
        }
    }
}

impl Forecaster for ResCnn {
    fn arch_name(&self) -> &'static str {
        "ResCnn"
    }

    fn window(&self) -> usize {
        self.config.window
    }

    fn horizon(&self) -> usize {
        self.config.horizon
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
        if features.ncols() != self.config.window {
            return Err(Error::shape(
                "features",
                self.config.window,
                features.ncols(),
            ));
        }

        let (batch, len) = features.dim();
        let x = features
            .to_shape((batch, 1, len))
            .map_err(|e| Error::Data(format!("reshape failed: {e}")))?
            .to_owned();

        let mut hidden = relu_3d(&self.stem.forward(&x));
        for block in &self.blocks {
            let convolved = relu_3d(&block.forward(&hidden));
            hidden = convolved + &hidden;
        }

        // Global average pool over time
        let pooled: Array2<f32> = hidden.mean_axis(Axis(2)).expect("non-empty time axis");
        Ok(self.head.forward(&pooled))
    }

    fn load_params(&mut self, params: &ParamMap) -> Result<()> {
        self.stem.load(params, "stem")?;
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.load(params, &format!("block{i}"))?;
        }
        self.head.load(params, "head")
    }

    fn export_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        self.stem.store(&mut params, "stem");
        for (i, block) in self.blocks.iter().enumerate() {
            block.store(&mut params, &format!("block{i}"));
        }
        self.head.store(&mut params, "head");
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ResCnn {
        ResCnn::new(ResCnnConfig {
            window: 8,
            horizon: 2,
            channels: 4,
            blocks: 2,
            kernel: 3,
        })
    }

    #[test]
    fn test_forward_shape() {
        let model = small();
        let x = Array2::zeros((5, 8));
        let y = model.forward(&x).unwrap();
        assert_eq!(y.dim(), (5, 2));
    }

    #[test]
    fn test_forward_rejects_wrong_window() {
        let model = small();
        let x = Array2::zeros((5, 9));
        assert!(model.forward(&x).is_err());
    }

    #[test]
    fn test_forward_deterministic_in_eval() {
        let mut model = small();
        model.set_mode(Mode::Eval);
        let x = Array2::from_shape_fn((3, 8), |(r, c)| (r * 8 + c) as f32 * 0.1);
        assert_eq!(model.forward(&x).unwrap(), model.forward(&x).unwrap());
    }

    #[test]
    fn test_params_round_trip() {
        let a = small();
        let params = a.export_params();

        let mut b = small();
        b.load_params(&params).unwrap();
        let x = Array2::from_shape_fn((2, 8), |(r, c)| (r + c) as f32);
        assert_eq!(a.forward(&x).unwrap(), b.forward(&x).unwrap());
    }

    #[test]
    fn test_load_missing_block_fails() {
        let mut model = small();
        let mut params = model.export_params();
        params.remove("block1.weight");
        assert!(model.load_params(&params).is_err());
    }

    #[test]
    fn test_default_configs() {
        assert_eq!(ResCnnConfig::univariate().horizon, 1);
        let ts = ResCnnConfig::target_series();
        assert_eq!(ts.window, ts.horizon);
    }
}
