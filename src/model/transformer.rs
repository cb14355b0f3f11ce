//! Attention-based forecasters
//!
//! One encoder-block implementation backs the three registered variants,
//! which differ in depth and dropout.

use super::layers::{relu, Dropout, LayerNorm, Linear, ParamMap};
use super::{Forecaster, Mode};
use crate::device::Device;
use crate::error::{Error, Result};
use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

const INIT_SEED: u64 = 0x7f0e;
const NORM_EPS: f32 = 1e-5;

/// Configuration shared by the transformer variants
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    /// Input window length
    pub window: usize,
    /// Forecast horizon
    pub horizon: usize,
    /// Embedding width
    pub d_model: usize,
    /// Attention heads; must divide `d_model`
    pub num_heads: usize,
    /// Feed-forward inner width
    pub ff_dim: usize,
    /// Encoder block count
    pub num_layers: usize,
    /// Dropout probability, active in training mode only
    pub dropout_rate: f32,
}

impl TransformerConfig {
    /// Single-block encoder over a short window
    pub fn simple() -> Self {
        Self {
            window: 30,
            horizon: 1,
            d_model: 32,
            num_heads: 4,
            ff_dim: 64,
            num_layers: 1,
            dropout_rate: 0.1,
        }
    }

    /// Single-block encoder sized for whole-series output
    pub fn target_series() -> Self {
        Self {
            window: 200,
            horizon: 200,
            dropout_rate: 0.25,
            ..Self::simple()
        }
    }

    /// Two-block encoder sized for whole-series output
    pub fn improved() -> Self {
        Self {
            num_layers: 2,
            ..Self::target_series()
        }
    }

    /// Three-block encoder sized for whole-series output
    pub fn three_layer() -> Self {
        Self {
            num_layers: 3,
            ..Self::target_series()
        }
    }
}

#[derive(Debug)]
struct EncoderBlock {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    norm1: LayerNorm,
    norm2: LayerNorm,
    ff1: Linear,
    ff2: Linear,
    dropout: Dropout,
    num_heads: usize,
}

impl EncoderBlock {
    fn new(config: &TransformerConfig, index: usize, rng: &mut StdRng) -> Self {
        let d = config.d_model;
        Self {
            query: Linear::new(d, d, rng),
            key: Linear::new(d, d, rng),
            value: Linear::new(d, d, rng),
            output: Linear::new(d, d, rng),
            norm1: LayerNorm::new(d, NORM_EPS),
            norm2: LayerNorm::new(d, NORM_EPS),
            ff1: Linear::new(d, config.ff_dim, rng),
            ff2: Linear::new(config.ff_dim, d, rng),
            dropout: Dropout::new(config.dropout_rate, INIT_SEED ^ index as u64),
            num_heads: config.num_heads,
        }
    }

    /// Self-attention plus feed-forward over one sample `[window, d_model]`
    fn forward(&self, hidden: &Array2<f32>, mode: Mode) -> Array2<f32> {
        let (len, d) = hidden.dim();
        let head_dim = d / self.num_heads;
        let scale = 1.0 / (head_dim as f32).sqrt();

        let q = self.query.forward(hidden);
        let k = self.key.forward(hidden);
        let v = self.value.forward(hidden);

        let mut context = Array2::zeros((len, d));
        for h in 0..self.num_heads {
            let (lo, hi) = (h * head_dim, (h + 1) * head_dim);
            let qh = q.slice(s![.., lo..hi]);
            let kh = k.slice(s![.., lo..hi]);
            let vh = v.slice(s![.., lo..hi]);

            let mut scores = qh.dot(&kh.t());
            scores.mapv_inplace(|v| v * scale);
            softmax_rows(&mut scores);

            context.slice_mut(s![.., lo..hi]).assign(&scores.dot(&vh));
        }

        let attended = self.dropout.forward(&self.output.forward(&context), mode);
        let hidden = self.norm1.forward(&(attended + hidden));

        let ff = self.ff2.forward(&relu(&self.ff1.forward(&hidden)));
        let ff = self.dropout.forward(&ff, mode);
        self.norm2.forward(&(ff + &hidden))
    }

    fn load(&mut self, params: &ParamMap, prefix: &str) -> Result<()> {
        self.query.load(params, &format!("{prefix}.attn.query"))?;
        self.key.load(params, &format!("{prefix}.attn.key"))?;
        self.value.load(params, &format!("{prefix}.attn.value"))?;
        self.output.load(params, &format!("{prefix}.attn.output"))?;
        self.norm1.load(params, &format!("{prefix}.norm1"))?;
        self.norm2.load(params, &format!("{prefix}.norm2"))?;
        self.ff1.load(params, &format!("{prefix}.ff1"))?;
        self.ff2.load(params, &format!("{prefix}.ff2"))
    }

    fn store(&self, params: &mut ParamMap, prefix: &str) {
        self.query.store(params, &format!("{prefix}.attn.query"));
        self.key.store(params, &format!("{prefix}.attn.key"));
        self.value.store(params, &format!("{prefix}.attn.value"));
        self.output.store(params, &format!("{prefix}.attn.output"));
        self.norm1.store(params, &format!("{prefix}.norm1"));
        self.norm2.store(params, &format!("{prefix}.norm2"));
        self.ff1.store(params, &format!("{prefix}.ff1"));
        self.ff2.store(params, &format!("{prefix}.ff2"));
    }
}

fn softmax_rows(scores: &mut Array2<f32>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum().max(f32::MIN_POSITIVE);
        row.mapv_inplace(|v| v / sum);
    }
}

/// Sinusoidal position encoding `[len, d_model]`
fn positional_encoding(len: usize, d_model: usize) -> Array2<f32> {
    let mut pos = Array2::zeros((len, d_model));
    for t in 0..len {
        for i in 0..d_model / 2 {
            let rate = (t as f32) / 10000f32.powf(2.0 * i as f32 / d_model as f32);
            pos[[t, 2 * i]] = rate.sin();
            pos[[t, 2 * i + 1]] = rate.cos();
        }
    }
    pos
}

/// Encoder-only transformer with a pooled linear head
#[derive(Debug)]
pub struct TransformerForecaster {
    arch: &'static str,
    config: TransformerConfig,
    embed: Linear,
    blocks: Vec<EncoderBlock>,
    head: Linear,
    mode: Mode,
    device: Device,
}

impl TransformerForecaster {
    /// Build a named variant with freshly initialized weights
    pub fn new(arch: &'static str, config: TransformerConfig) -> Self {
        assert!(
            config.d_model % config.num_heads == 0,
            "num_heads must divide d_model"
        );
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let embed = Linear::new(1, config.d_model, &mut rng);
        let blocks = (0..config.num_layers)
            .map(|i| EncoderBlock::new(&config, i, &mut rng))
            .collect();
        let head = Linear::new(config.d_model, config.horizon, &mut rng);
        Self {
            arch,
            config,
            embed,
            blocks,
            head,
            mode: Mode::default(),
            device: Device::default(),
        }
    }

    /// Single-block variant
    pub fn simple(config: TransformerConfig) -> Self {
        Self::new("SimpleTransformer", config)
    }

    /// Deeper variant for whole-series forecasting
    pub fn time_series(config: TransformerConfig) -> Self {
        Self::new("TimeSeriesTransformer", config)
    }

    /// Three-block variant
    pub fn three_layer(config: TransformerConfig) -> Self {
        Self::new("ThreeLayerTransformer", config)
    }
}

impl Forecaster for TransformerForecaster {
    fn arch_name(&self) -> &'static str {
        self.arch
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

        let pos = positional_encoding(self.config.window, self.config.d_model);
        let mut out = Array2::zeros((features.nrows(), self.config.horizon));

        for (row, sample) in features.rows().into_iter().enumerate() {
            // One token per time step
            let tokens = sample
                .to_owned()
                .into_shape_with_order((self.config.window, 1))
                .map_err(|e| Error::Data(format!("reshape failed: {e}")))?;
            let mut hidden = self.embed.forward(&tokens) + &pos;

            for block in &self.blocks {
                hidden = block.forward(&hidden, self.mode);
            }

            let pooled: Array1<f32> = hidden.mean_axis(Axis(0)).expect("non-empty window");
            let pooled = pooled
                .into_shape_with_order((1, self.config.d_model))
                .map_err(|e| Error::Data(format!("reshape failed: {e}")))?;
            out.row_mut(row).assign(&self.head.forward(&pooled).row(0));
        }
        Ok(out)
    }

    fn load_params(&mut self, params: &ParamMap) -> Result<()> {
        self.embed.load(params, "embed")?;
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.load(params, &format!("layer{i}"))?;
        }
        self.head.load(params, "head")
    }

    fn export_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        self.embed.store(&mut params, "embed");
        for (i, block) in self.blocks.iter().enumerate() {
            block.store(&mut params, &format!("layer{i}"));
        }
        self.head.store(&mut params, "head");
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TransformerForecaster {
        TransformerForecaster::simple(TransformerConfig {
            window: 6,
            horizon: 2,
            d_model: 8,
            num_heads: 2,
            ff_dim: 16,
            num_layers: 2,
            dropout_rate: 0.1,
        })
    }

    #[test]
    fn test_forward_shape() {
        let model = small();
        assert_eq!(model.forward(&Array2::zeros((4, 6))).unwrap().dim(), (4, 2));
    }

    #[test]
    fn test_forward_rejects_wrong_window() {
        let model = small();
        assert!(model.forward(&Array2::zeros((4, 5))).is_err());
    }

    #[test]
    fn test_eval_mode_deterministic() {
        let mut model = small();
        model.set_mode(Mode::Eval);
        let x = Array2::from_shape_fn((2, 6), |(r, c)| (r * 6 + c) as f32 * 0.1);
        assert_eq!(model.forward(&x).unwrap(), model.forward(&x).unwrap());
    }

    #[test]
    fn test_train_mode_dropout_differs_from_eval() {
        let mut model = small();
        let x = Array2::from_shape_fn((2, 6), |(r, c)| (r * 6 + c) as f32 * 0.1 + 0.5);
        model.set_mode(Mode::Train);
        let train_out = model.forward(&x).unwrap();
        model.set_mode(Mode::Eval);
        let eval_out = model.forward(&x).unwrap();
        assert_ne!(train_out, eval_out);
    }

    #[test]
    fn test_params_round_trip() {
        let a = small();
        let mut b = small();
        b.load_params(&a.export_params()).unwrap();
        let x = Array2::from_shape_fn((2, 6), |(r, c)| (r + c) as f32 * 0.2);
        assert_eq!(a.forward(&x).unwrap(), b.forward(&x).unwrap());
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut scores = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0]).unwrap();
        softmax_rows(&mut scores);
        for row in scores.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_positional_encoding_first_row() {
        let pos = positional_encoding(4, 8);
        // Position zero encodes sin(0)=0, cos(0)=1 pairs
        assert_eq!(pos[[0, 0]], 0.0);
        assert_eq!(pos[[0, 1]], 1.0);
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(
            TransformerForecaster::time_series(TransformerConfig::improved()).arch_name(),
            "TimeSeriesTransformer"
        );
        assert_eq!(
            TransformerForecaster::three_layer(TransformerConfig::three_layer()).arch_name(),
            "ThreeLayerTransformer"
        );
    }

    #[test]
    #[should_panic(expected = "num_heads must divide d_model")]
    fn test_head_divisibility_checked() {
        TransformerForecaster::simple(TransformerConfig {
            d_model: 10,
            num_heads: 3,
            ..TransformerConfig::simple()
        });
    }
}
