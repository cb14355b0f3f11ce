//! Forward-only building blocks shared by the architectures
//!
//! Parameters travel as flat `f32` buffers in a [`ParamMap`]; each layer
//! knows its expected element counts and validates them at load time.

use super::Mode;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;

/// Flat parameter snapshot keyed by dotted names
pub type ParamMap = BTreeMap<String, Vec<f32>>;

/// Look up a parameter buffer and validate its element count
pub(crate) fn fetch<'a>(params: &'a ParamMap, key: &str, expected: usize) -> Result<&'a [f32]> {
    let values = params
        .get(key)
        .ok_or_else(|| Error::MissingParameter(key.to_string()))?;
    if values.len() != expected {
        return Err(Error::shape(key, expected, values.len()));
    }
    Ok(values)
}

pub(crate) fn init_uniform(rng: &mut StdRng, len: usize, bound: f32) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-bound..bound)).collect()
}

/// Fully connected layer, `y = x W^T + b`
#[derive(Debug)]
pub struct Linear {
    /// Weight matrix `[out_features, in_features]`
    pub weight: Array2<f32>,
    /// Bias vector `[out_features]`
    pub bias: Array1<f32>,
}

impl Linear {
    /// Create with uniform initialization scaled by fan-in
    pub fn new(in_features: usize, out_features: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        let weight = Array2::from_shape_vec(
            (out_features, in_features),
            init_uniform(rng, out_features * in_features, bound),
        )
        .expect("weight buffer matches declared shape");
        let bias = Array1::from_vec(init_uniform(rng, out_features, bound));
        Self { weight, bias }
    }

    /// Input width
    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    /// Output width
    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    /// Forward pass over a batch `[rows, in] -> [rows, out]`
    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.weight.t()) + &self.bias
    }

    /// Load `{prefix}.weight` and `{prefix}.bias`
    pub fn load(&mut self, params: &ParamMap, prefix: &str) -> Result<()> {
        let (out, inp) = (self.out_features(), self.in_features());
        let weight = fetch(params, &format!("{prefix}.weight"), out * inp)?;
        let bias = fetch(params, &format!("{prefix}.bias"), out)?;
        self.weight = Array2::from_shape_vec((out, inp), weight.to_vec())
            .expect("validated length matches shape");
        self.bias = Array1::from_vec(bias.to_vec());
        Ok(())
    }

    /// Store under `{prefix}.weight` and `{prefix}.bias`
    pub fn store(&self, params: &mut ParamMap, prefix: &str) {
        params.insert(
            format!("{prefix}.weight"),
            self.weight.iter().copied().collect(),
        );
        params.insert(format!("{prefix}.bias"), self.bias.to_vec());
    }
}

/// 1-D convolution with same-length output (stride 1, zero padding)
#[derive(Debug)]
pub struct Conv1d {
    /// Kernel weights `[out_channels, in_channels, kernel]`
    pub weight: Array3<f32>,
    /// Bias vector `[out_channels]`
    pub bias: Array1<f32>,
}

impl Conv1d {
    /// Create with uniform initialization scaled by fan-in
    pub fn new(in_channels: usize, out_channels: usize, kernel: usize, rng: &mut StdRng) -> Self {
        assert!(kernel % 2 == 1, "kernel size must be odd for same padding");
        let fan_in = in_channels * kernel;
        let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
        let weight = Array3::from_shape_vec(
            (out_channels, in_channels, kernel),
            init_uniform(rng, out_channels * fan_in, bound),
        )
        .expect("weight buffer matches declared shape");
        let bias = Array1::from_vec(init_uniform(rng, out_channels, bound));
        Self { weight, bias }
    }

    /// Number of output channels
    pub fn out_channels(&self) -> usize {
        self.weight.dim().0
    }

    /// Forward pass `[batch, in_channels, len] -> [batch, out_channels, len]`
    pub fn forward(&self, x: &Array3<f32>) -> Array3<f32> {
        let (batch, in_c, len) = x.dim();
        let (out_c, w_in_c, kernel) = self.weight.dim();
        assert_eq!(in_c, w_in_c, "input channels must match kernel channels");
        let pad = kernel / 2;

        let mut out = Array3::zeros((batch, out_c, len));
        for b in 0..batch {
            for oc in 0..out_c {
                for t in 0..len {
                    let mut acc = self.bias[oc];
                    for ic in 0..in_c {
                        for k in 0..kernel {
                            let src = t + k;
                            if src >= pad && src - pad < len {
                                acc += self.weight[[oc, ic, k]] * x[[b, ic, src - pad]];
                            }
                        }
                    }
                    out[[b, oc, t]] = acc;
                }
            }
        }
        out
    }

    /// Load `{prefix}.weight` and `{prefix}.bias`
    pub fn load(&mut self, params: &ParamMap, prefix: &str) -> Result<()> {
        let (out_c, in_c, kernel) = self.weight.dim();
        let weight = fetch(params, &format!("{prefix}.weight"), out_c * in_c * kernel)?;
        let bias = fetch(params, &format!("{prefix}.bias"), out_c)?;
        self.weight = Array3::from_shape_vec((out_c, in_c, kernel), weight.to_vec())
            .expect("validated length matches shape");
        self.bias = Array1::from_vec(bias.to_vec());
        Ok(())
    }

    /// Store under `{prefix}.weight` and `{prefix}.bias`
    pub fn store(&self, params: &mut ParamMap, prefix: &str) {
        params.insert(
            format!("{prefix}.weight"),
            self.weight.iter().copied().collect(),
        );
        params.insert(format!("{prefix}.bias"), self.bias.to_vec());
    }
}

/// Layer normalization over the last dimension
#[derive(Debug)]
pub struct LayerNorm {
    /// Scale parameter
    pub gamma: Array1<f32>,
    /// Shift parameter
    pub beta: Array1<f32>,
    eps: f32,
}

impl LayerNorm {
    /// Create with identity scale and zero shift
    pub fn new(width: usize, eps: f32) -> Self {
        Self {
            gamma: Array1::ones(width),
            beta: Array1::zeros(width),
            eps,
        }
    }

    /// Normalize each row of `[rows, width]` independently
    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        let width = x.ncols() as f32;
        let mut out = x.clone();
        for mut row in out.rows_mut() {
            let mean = row.sum() / width;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / width;
            let denom = (var + self.eps).sqrt();
            for (i, v) in row.iter_mut().enumerate() {
                *v = (*v - mean) / denom * self.gamma[i] + self.beta[i];
            }
        }
        out
    }

    /// Load `{prefix}.gamma` and `{prefix}.beta`
    pub fn load(&mut self, params: &ParamMap, prefix: &str) -> Result<()> {
        let width = self.gamma.len();
        let gamma = fetch(params, &format!("{prefix}.gamma"), width)?;
        let beta = fetch(params, &format!("{prefix}.beta"), width)?;
        self.gamma = Array1::from_vec(gamma.to_vec());
        self.beta = Array1::from_vec(beta.to_vec());
        Ok(())
    }

    /// Store under `{prefix}.gamma` and `{prefix}.beta`
    pub fn store(&self, params: &mut ParamMap, prefix: &str) {
        params.insert(format!("{prefix}.gamma"), self.gamma.to_vec());
        params.insert(format!("{prefix}.beta"), self.beta.to_vec());
    }
}

/// Inverted dropout, active only in training mode
///
/// The mask comes from a small LCG so a given seed reproduces the same
/// mask; evaluation mode is the identity.
#[derive(Debug)]
pub struct Dropout {
    rate: f32,
    seed: u64,
}

impl Dropout {
    /// Create with the given drop probability
    pub fn new(rate: f32, seed: u64) -> Self {
        assert!((0.0..1.0).contains(&rate), "rate must be in [0, 1)");
        Self { rate, seed }
    }

    /// The configured drop probability
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Apply dropout in training mode; identity in evaluation mode
    pub fn forward(&self, x: &Array2<f32>, mode: Mode) -> Array2<f32> {
        if mode == Mode::Eval || self.rate == 0.0 {
            return x.clone();
        }
        let keep_scale = 1.0 / (1.0 - self.rate);
        let mut state = self.seed;
        x.mapv(|v| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let draw = ((state >> 33) & 0x7fff_ffff) as f32 / 0x8000_0000u32 as f32;
            if draw < self.rate {
                0.0
            } else {
                v * keep_scale
            }
        })
    }
}

/// Element-wise rectified linear unit
pub fn relu(x: &Array2<f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

/// Rectified linear unit over channel maps
pub fn relu_3d(x: &Array3<f32>) -> Array3<f32> {
    x.mapv(|v| v.max(0.0))
}
