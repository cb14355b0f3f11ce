//! Dataset abstractions and the sliding-window series dataset

use crate::error::{Error, Result};
use ndarray::Array1;
use std::path::Path;

/// Finite, indexed access to (features, target) samples
pub trait Dataset {
    /// Number of samples
    fn len(&self) -> usize;

    /// Whether the dataset holds no samples
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of one feature vector
    fn feature_width(&self) -> usize;

    /// Width of one target vector
    fn target_width(&self) -> usize;

    /// Fetch the sample at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn sample(&self, index: usize) -> (Array1<f32>, Array1<f32>);
}

/// Sliding windows over a univariate series
///
/// Sample `i` pairs `window` consecutive values as features with the
/// following `horizon` values as the target. A series shorter than
/// `window + horizon` yields no samples.
#[derive(Debug, Clone)]
pub struct SeriesDataset {
    values: Vec<f32>,
    window: usize,
    horizon: usize,
}

impl SeriesDataset {
    /// Build from an in-memory series
    pub fn from_series(values: Vec<f32>, window: usize, horizon: usize) -> Result<Self> {
        if window == 0 || horizon == 0 {
            return Err(Error::Config(
                "window and horizon must be positive".to_string(),
            ));
        }
        Ok(Self {
            values,
            window,
            horizon,
        })
    }

    /// Build by reading one numeric column from a CSV file
    pub fn from_csv(
        path: impl AsRef<Path>,
        column: &str,
        window: usize,
        horizon: usize,
    ) -> Result<Self> {
        let values = read_series_csv(path, column)?;
        Self::from_series(values, window, horizon)
    }

    /// The configured window length
    pub fn window(&self) -> usize {
        self.window
    }

    /// The configured forecast horizon
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// The underlying series values
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl Dataset for SeriesDataset {
    fn len(&self) -> usize {
        let needed = self.window + self.horizon;
        if self.values.len() < needed {
            0
        } else {
            self.values.len() - needed + 1
        }
    }

    fn feature_width(&self) -> usize {
        self.window
    }

    fn target_width(&self) -> usize {
        self.horizon
    }

    fn sample(&self, index: usize) -> (Array1<f32>, Array1<f32>) {
        assert!(index < self.len(), "sample index out of range");
        let feat_end = index + self.window;
        let features = Array1::from_vec(self.values[index..feat_end].to_vec());
        let targets = Array1::from_vec(self.values[feat_end..feat_end + self.horizon].to_vec());
        (features, targets)
    }
}

/// Read one numeric column from a CSV file with headers
///
/// Column lookup is case-insensitive. Rows whose cell fails to parse are a
/// [`Error::Data`] failure, not silently skipped.
pub fn read_series_csv(path: impl AsRef<Path>, column: &str) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Data(format!("Failed to open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::Data(format!("Failed to read CSV headers: {e}")))?;
    let col_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            Error::Data(format!(
                "Column '{column}' not found (headers: {})",
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Data(format!("CSV row {row}: {e}")))?;
        let cell = record
            .get(col_idx)
            .ok_or_else(|| Error::Data(format!("CSV row {row}: missing column {col_idx}")))?;
        let value: f32 = cell
            .trim()
            .parse()
            .map_err(|_| Error::Data(format!("CSV row {row}: cannot parse '{cell}'")))?;
        values.push(value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_window_count() {
        let ds = SeriesDataset::from_series((0..10).map(|v| v as f32).collect(), 4, 1).unwrap();
        // 10 - 4 - 1 + 1 = 6 windows
        assert_eq!(ds.len(), 6);
    }

    #[test]
    fn test_sample_contents() {
        let ds = SeriesDataset::from_series(vec![1.0, 2.0, 3.0, 4.0, 5.0], 3, 2).unwrap();
        assert_eq!(ds.len(), 1);
        let (features, targets) = ds.sample(0);
        assert_eq!(features.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(targets.to_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_short_series_is_empty() {
        let ds = SeriesDataset::from_series(vec![1.0, 2.0], 4, 1).unwrap();
        assert_eq!(ds.len(), 0);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(SeriesDataset::from_series(vec![1.0], 0, 1).is_err());
    }

    #[test]
    fn test_read_series_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "date,close").unwrap();
        writeln!(file, "2023-01-01,10.5").unwrap();
        writeln!(file, "2023-01-02,11.25").unwrap();
        file.flush().unwrap();

        let values = read_series_csv(file.path(), "Close").unwrap();
        assert_eq!(values, vec![10.5, 11.25]);
    }

    #[test]
    fn test_read_series_csv_missing_column() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "date,open").unwrap();
        writeln!(file, "2023-01-01,10.5").unwrap();
        file.flush().unwrap();

        let err = read_series_csv(file.path(), "close").unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_read_series_csv_bad_cell() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "close").unwrap();
        writeln!(file, "not-a-number").unwrap();
        file.flush().unwrap();

        assert!(read_series_csv(file.path(), "close").is_err());
    }
}
