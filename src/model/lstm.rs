//! Gated recurrent forecaster

use super::layers::{fetch, init_uniform, Linear, ParamMap};
use super::{Forecaster, Mode};
use crate::device::Device;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

const INIT_SEED: u64 = 0x157a;

/// Configuration for [`LstmRegressor`]
#[derive(Debug, Clone)]
pub struct LstmConfig {
    /// Input window length
    pub window: usize,
    /// Values consumed per recurrence step; the window must divide evenly
    pub input_size: usize,
    /// Hidden state width
    pub hidden_size: usize,
    /// Forecast horizon
    pub output_size: usize,
}

impl LstmConfig {
    /// Step-by-step scan over a short window, next-step output
    pub fn univariate() -> Self {
        Self {
            window: 30,
            input_size: 1,
            hidden_size: 64,
            output_size: 1,
        }
    }

    /// Whole-window input in one step, window-sized output
    pub fn target_series() -> Self {
        Self {
            window: 200,
            input_size: 200,
            hidden_size: 64,
            output_size: 200,
        }
    }
}

/// Single-layer LSTM with a linear readout of the final hidden state
#[derive(Debug)]
pub struct LstmRegressor {
    config: LstmConfig,
    /// Input-to-gates weights `[4 * hidden, input_size]`
    w_ih: Array2<f32>,
    /// Hidden-to-gates weights `[4 * hidden, hidden]`
    w_hh: Array2<f32>,
    /// Gate biases `[4 * hidden]`
    bias: Array1<f32>,
    head: Linear,
    mode: Mode,
    device: Device,
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

impl LstmRegressor {
    /// Build with freshly initialized weights
    pub fn new(config: LstmConfig) -> Self {
        assert!(
            config.window % config.input_size == 0,
            "window must be a multiple of input_size"
        );
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let gates = 4 * config.hidden_size;
        let bound = 1.0 / (config.hidden_size as f32).sqrt();
        let w_ih = Array2::from_shape_vec(
            (gates, config.input_size),
            init_uniform(&mut rng, gates * config.input_size, bound),
        )
        .expect("weight buffer matches declared shape");
        let w_hh = Array2::from_shape_vec(
            (gates, config.hidden_size),
            init_uniform(&mut rng, gates * config.hidden_size, bound),
        )
        .expect("weight buffer matches declared shape");
        let bias = Array1::from_vec(init_uniform(&mut rng, gates, bound));
        let head = Linear::new(config.hidden_size, config.output_size, &mut rng);
        Self {
            config,
            w_ih,
            w_hh,
            bias,
            head,
            mode: Mode::default(),
            device: Device::default(),
        }
    }

    /// Run the recurrence over one sample, returning the final hidden state
    fn scan(&self, sample: &[f32]) -> Array1<f32> {
        let hidden = self.config.hidden_size;
        let mut h = Array1::<f32>::zeros(hidden);
        let mut c = Array1::<f32>::zeros(hidden);

        for chunk in sample.chunks_exact(self.config.input_size) {
            let x_t = Array1::from_vec(chunk.to_vec());
            let gates = self.w_ih.dot(&x_t) + self.w_hh.dot(&h) + &self.bias;
            for j in 0..hidden {
                let i_gate = sigmoid(gates[j]);
                let f_gate = sigmoid(gates[hidden + j]);
                let g_gate = gates[2 * hidden + j].tanh();
                let o_gate = sigmoid(gates[3 * hidden + j]);
                c[j] = f_gate * c[j] + i_gate * g_gate;
                h[j] = o_gate * c[j].tanh();
            }
        }
        h
    }
}

impl Forecaster for LstmRegressor {
    fn arch_name(&self) -> &'static str {
        "LstmRegressor"
    }

    fn window(&self) -> usize {
        self.config.window
    }

    fn horizon(&self) -> usize {
        self.config.output_size
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

        let mut states = Array2::zeros((features.nrows(), self.config.hidden_size));
        for (row, sample) in features.rows().into_iter().enumerate() {
            let h = self.scan(sample.as_slice().expect("contiguous feature row"));
            states.row_mut(row).assign(&h);
        }
        Ok(self.head.forward(&states))
    }

    fn load_params(&mut self, params: &ParamMap) -> Result<()> {
        let gates = 4 * self.config.hidden_size;
        let w_ih = fetch(params, "lstm.w_ih", gates * self.config.input_size)?;
        let w_hh = fetch(params, "lstm.w_hh", gates * self.config.hidden_size)?;
        let bias = fetch(params, "lstm.bias", gates)?;
        self.w_ih = Array2::from_shape_vec((gates, self.config.input_size), w_ih.to_vec())
            .expect("validated length matches shape");
        self.w_hh = Array2::from_shape_vec((gates, self.config.hidden_size), w_hh.to_vec())
            .expect("validated length matches shape");
        self.bias = Array1::from_vec(bias.to_vec());
        self.head.load(params, "head")
    }

    fn export_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("lstm.w_ih".to_string(), self.w_ih.iter().copied().collect());
        params.insert("lstm.w_hh".to_string(), self.w_hh.iter().copied().collect());
        params.insert("lstm.bias".to_string(), self.bias.to_vec());
        self.head.store(&mut params, "head");
        params
    }
}
