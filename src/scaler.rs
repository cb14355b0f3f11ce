//! Reversible value-range transforms
//!
//! A fitted scaler maps raw values into a normalized range and back. The
//! same fitted state must serve both directions: training-time forward
//! transforms and evaluation-time inverse transforms.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};

const MIN_SPREAD: f32 = 1e-8;

/// A fitted, reversible transform between normalized and raw value spaces
pub trait Scaler {
    /// Map raw values into the normalized space
    fn transform(&self, data: &Array2<f32>) -> Result<Array2<f32>>;

    /// Map normalized values back into the raw space
    fn inverse_transform(&self, data: &Array2<f32>) -> Result<Array2<f32>>;

    /// Number of columns this scaler was fitted on
    ///
    /// A width of 1 broadcasts over any number of columns, which is the
    /// natural fit for windows cut from a single scaled series.
    fn width(&self) -> usize;
}

fn check_width(name: &str, scaler_width: usize, data_width: usize) -> Result<()> {
    if scaler_width != 1 && scaler_width != data_width {
        return Err(Error::shape(name, scaler_width, data_width));
    }
    Ok(())
}

/// Standardizes columns to zero mean and unit variance
///
/// # Example
///
/// ```
/// use evaluar::scaler::{Scaler, StandardScaler};
/// use ndarray::Array2;
///
/// let data = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let scaler = StandardScaler::fit(&data);
/// let scaled = scaler.transform(&data).unwrap();
/// let restored = scaler.inverse_transform(&scaled).unwrap();
/// assert!((restored[[0, 0]] - 1.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f32>,
    std: Array1<f32>,
}

impl StandardScaler {
    /// Fit per-column mean and standard deviation
    pub fn fit(data: &Array2<f32>) -> Self {
        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(data.ncols()));
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| s.max(MIN_SPREAD));
        Self { mean, std }
    }

    /// Fit on a single series, producing a width-1 scaler
    pub fn fit_series(values: &[f32]) -> Self {
        let n = values.len().max(1) as f32;
        let mean = values.iter().sum::<f32>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        Self {
            mean: Array1::from_vec(vec![mean]),
            std: Array1::from_vec(vec![var.sqrt().max(MIN_SPREAD)]),
        }
    }

    fn column_params(&self, col: usize) -> (f32, f32) {
        if self.width() == 1 {
            (self.mean[0], self.std[0])
        } else {
            (self.mean[col], self.std[col])
        }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, data: &Array2<f32>) -> Result<Array2<f32>> {
        check_width("StandardScaler", self.width(), data.ncols())?;
        let mut out = data.clone();
        for col in 0..out.ncols() {
            let (mean, std) = self.column_params(col);
            out.column_mut(col).mapv_inplace(|v| (v - mean) / std);
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Array2<f32>) -> Result<Array2<f32>> {
        check_width("StandardScaler", self.width(), data.ncols())?;
        let mut out = data.clone();
        for col in 0..out.ncols() {
            let (mean, std) = self.column_params(col);
            out.column_mut(col).mapv_inplace(|v| v * std + mean);
        }
        Ok(out)
    }

    fn width(&self) -> usize {
        self.mean.len()
    }
}

/// Rescales columns into a fixed target range
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min_vals: Array1<f32>,
    max_vals: Array1<f32>,
    min_range: f32,
    max_range: f32,
}

impl MinMaxScaler {
    /// Fit per-column minima and maxima, targeting [0, 1]
    pub fn fit(data: &Array2<f32>) -> Self {
        Self::fit_with_range(data, 0.0, 1.0)
    }

    /// Fit with a custom target range
    pub fn fit_with_range(data: &Array2<f32>, min_range: f32, max_range: f32) -> Self {
        let cols = data.ncols();
        let mut min_vals = Array1::from_elem(cols, f32::INFINITY);
        let mut max_vals = Array1::from_elem(cols, f32::NEG_INFINITY);
        for row in data.rows() {
            for (col, &v) in row.iter().enumerate() {
                if v < min_vals[col] {
                    min_vals[col] = v;
                }
                if v > max_vals[col] {
                    max_vals[col] = v;
                }
            }
        }
        Self {
            min_vals,
            max_vals,
            min_range,
            max_range,
        }
    }

    fn column_params(&self, col: usize) -> (f32, f32) {
        let idx = if self.width() == 1 { 0 } else { col };
        (self.min_vals[idx], self.max_vals[idx])
    }
}

impl Scaler for MinMaxScaler {
    fn transform(&self, data: &Array2<f32>) -> Result<Array2<f32>> {
        check_width("MinMaxScaler", self.width(), data.ncols())?;
        let scale = self.max_range - self.min_range;
        let mut out = data.clone();
        for col in 0..out.ncols() {
            let (min, max) = self.column_params(col);
            let spread = max - min;
            out.column_mut(col).mapv_inplace(|v| {
                if spread > MIN_SPREAD {
                    (v - min) / spread * scale + self.min_range
                } else {
                    self.min_range
                }
            });
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Array2<f32>) -> Result<Array2<f32>> {
        check_width("MinMaxScaler", self.width(), data.ncols())?;
        let scale = self.max_range - self.min_range;
        let mut out = data.clone();
        for col in 0..out.ncols() {
            let (min, max) = self.column_params(col);
            let spread = max - min;
            out.column_mut(col)
                .mapv_inplace(|v| (v - self.min_range) / scale * spread + min);
        }
        Ok(out)
    }

    fn width(&self) -> usize {
        self.min_vals.len()
    }
}
