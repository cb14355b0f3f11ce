//! Diagonal state-space forecaster

use super::layers::{fetch, Linear, ParamMap};
use super::{Forecaster, Mode};
use crate::device::Device;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INIT_SEED: u64 = 0x5500;

/// Configuration for [`StateSpace`]
#[derive(Debug, Clone)]
pub struct StateSpaceConfig {
    /// Input window length
    pub window: usize,
    /// Forecast horizon
    pub horizon: usize,
    /// Number of independent state channels
    pub channels: usize,
}

impl StateSpaceConfig {
    /// Next-step forecasting over a short window
    pub fn univariate() -> Self {
        Self {
            window: 30,
            horizon: 1,
            channels: 64,
        }
    }
}

/// Diagonal linear state-space scan with a linear readout
///
/// Each channel runs an independent first-order recurrence over the window;
/// the final states, plus a per-channel skip of the window mean, feed the
/// output head.
#[derive(Debug)]
pub struct StateSpace {
    config: StateSpaceConfig,
    /// Per-channel state decay, in (0, 1)
    decay: Array1<f32>,
    /// Per-channel input gain
    input_gain: Array1<f32>,
    /// Per-channel readout scale
    readout: Array1<f32>,
    /// Per-channel skip connection weight
    skip: Array1<f32>,
    head: Linear,
    mode: Mode,
    device: Device,
}

impl StateSpace {
    /// Build with freshly initialized weights
    pub fn new(config: StateSpaceConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let channels = config.channels;
        let decay = Array1::from_vec((0..channels).map(|_| rng.gen_range(0.5..0.99)).collect());
        let input_gain =
            Array1::from_vec((0..channels).map(|_| rng.gen_range(-1.0..1.0)).collect());
        let readout = Array1::from_vec((0..channels).map(|_| rng.gen_range(-1.0..1.0)).collect());
        let skip = Array1::from_vec((0..channels).map(|_| rng.gen_range(-0.1..0.1)).collect());
        let head = Linear::new(channels, config.horizon, &mut rng);
        Self {
            config,
            decay,
            input_gain,
            readout,
            skip,
            head,
            mode: Mode::default(),
            device: Device::default(),
        }
    }
}

impl Forecaster for StateSpace {
    fn arch_name(&self) -> &'static str {
        "StateSpace"
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

        let channels = self.config.channels;
        let mut states = Array2::zeros((features.nrows(), channels));
        for (row, sample) in features.rows().into_iter().enumerate() {
            let mean = sample.sum() / sample.len().max(1) as f32;
            for ch in 0..channels {
                let mut s = 0.0f32;
                for &u in sample.iter() {
                    s = self.decay[ch] * s + self.input_gain[ch] * u;
                }
                states[[row, ch]] = self.readout[ch] * s + self.skip[ch] * mean;
            }
        }
        Ok(self.head.forward(&states))
    }

    fn load_params(&mut self, params: &ParamMap) -> Result<()> {
        let channels = self.config.channels;
        self.decay = Array1::from_vec(fetch(params, "ssm.decay", channels)?.to_vec());
        self.input_gain = Array1::from_vec(fetch(params, "ssm.input_gain", channels)?.to_vec());
        self.readout = Array1::from_vec(fetch(params, "ssm.readout", channels)?.to_vec());
        self.skip = Array1::from_vec(fetch(params, "ssm.skip", channels)?.to_vec());
        self.head.load(params, "head")
    }

    fn export_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("ssm.decay".to_string(), self.decay.to_vec());
        params.insert("ssm.input_gain".to_string(), self.input_gain.to_vec());
        params.insert("ssm.readout".to_string(), self.readout.to_vec());
        params.insert("ssm.skip".to_string(), self.skip.to_vec());
        self.head.store(&mut params, "head");
        params
    }
}
