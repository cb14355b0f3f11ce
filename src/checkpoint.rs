//! Checkpoint loading and saving
//!
//! A checkpoint is a persisted snapshot of a model's parameters plus
//! training metadata. The format is detected from the file extension:
//! `.json` (text) or `.safetensors` (binary, HuggingFace compatible).

use crate::error::{Error, Result};
use crate::model::ParamMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Training metadata carried alongside the parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Registry identifier of the model the snapshot belongs to
    pub model_type: String,
    /// Epoch the snapshot was taken at
    pub epoch: usize,
    /// Validation loss recorded at save time, if any
    pub val_loss: Option<f32>,
}

impl CheckpointMetadata {
    /// Create metadata with minimal fields
    pub fn new(model_type: impl Into<String>, epoch: usize) -> Self {
        Self {
            model_type: model_type.into(),
            epoch,
            val_loss: None,
        }
    }

    /// Attach a recorded validation loss
    pub fn with_val_loss(mut self, val_loss: f32) -> Self {
        self.val_loss = Some(val_loss);
        self
    }
}

/// A loaded parameter snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Snapshot metadata
    pub metadata: CheckpointMetadata,
    /// Flat parameter buffers keyed by dotted names
    pub params: ParamMap,
}

impl Checkpoint {
    /// Create a checkpoint from metadata and parameters
    pub fn new(metadata: CheckpointMetadata, params: ParamMap) -> Self {
        Self { metadata, params }
    }
}

fn extension_of(path: &Path) -> Result<&str> {
    path.extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Serialization("File has no extension".to_string()))
}

/// Load a checkpoint from a file
///
/// The format is detected from the file extension.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Checkpoint> {
    let path = path.as_ref();
    match extension_of(path)? {
        "json" => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}")))
        }
        "safetensors" => load_safetensors(path),
        ext => Err(Error::Serialization(format!(
            "Unsupported file extension: {ext}"
        ))),
    }
}

/// Save a checkpoint to a file
///
/// The format is detected from the file extension.
pub fn save_checkpoint(checkpoint: &Checkpoint, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match extension_of(path)? {
        "json" => {
            let content = serde_json::to_string_pretty(checkpoint)
                .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?;
            std::fs::write(path, content)?;
            Ok(())
        }
        "safetensors" => save_safetensors(checkpoint, path),
        ext => Err(Error::Serialization(format!(
            "Unsupported file extension: {ext}"
        ))),
    }
}

fn load_safetensors(path: &Path) -> Result<Checkpoint> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Serialization(format!("Failed to read file: {e}")))?;

    let (_, st_metadata) = safetensors::SafeTensors::read_metadata(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;

    let custom_meta = st_metadata.metadata();
    let model_type = custom_meta
        .as_ref()
        .and_then(|m| m.get("model_type").cloned())
        .unwrap_or_else(|| "unknown".to_string());
    let epoch = custom_meta
        .as_ref()
        .and_then(|m| m.get("epoch"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let val_loss = custom_meta
        .as_ref()
        .and_then(|m| m.get("val_loss"))
        .and_then(|v| v.parse().ok());

    let tensors = safetensors::SafeTensors::deserialize(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;

    let mut params = ParamMap::new();
    for name in tensors.names() {
        let view = tensors
            .tensor(name)
            .expect("tensor name from names() must exist in SafeTensors");
        let values: &[f32] = bytemuck::cast_slice(view.data());
        params.insert(name.to_string(), values.to_vec());
    }

    Ok(Checkpoint {
        metadata: CheckpointMetadata {
            model_type,
            epoch,
            val_loss,
        },
        params,
    })
}

fn save_safetensors(checkpoint: &Checkpoint, path: &Path) -> Result<()> {
    let views: Vec<(String, safetensors::tensor::TensorView<'_>)> = checkpoint
        .params
        .iter()
        .map(|(name, values)| {
            let view = safetensors::tensor::TensorView::new(
                safetensors::Dtype::F32,
                vec![values.len()],
                bytemuck::cast_slice(values),
            )
            .map_err(|e| Error::Serialization(format!("SafeTensors view failed: {e:?}")))?;
            Ok((name.clone(), view))
        })
        .collect::<Result<_>>()?;

    let mut meta = HashMap::new();
    meta.insert(
        "model_type".to_string(),
        checkpoint.metadata.model_type.clone(),
    );
    meta.insert("epoch".to_string(), checkpoint.metadata.epoch.to_string());
    if let Some(val_loss) = checkpoint.metadata.val_loss {
        meta.insert("val_loss".to_string(), val_loss.to_string());
    }

    let bytes = safetensors::serialize(views, &Some(meta))
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e:?}")))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkpoint() -> Checkpoint {
        let mut params = ParamMap::new();
        params.insert("head.weight".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        params.insert("head.bias".to_string(), vec![0.1]);
        Checkpoint::new(
            CheckpointMetadata::new("lstm", 2).with_val_loss(6.47),
            params,
        )
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let original = sample_checkpoint();
        save_checkpoint(&original, &path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(loaded.metadata.model_type, "lstm");
        assert_eq!(loaded.metadata.epoch, 2);
        assert_eq!(loaded.params, original.params);
    }

    #[test]
    fn test_safetensors_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");

        let original = sample_checkpoint();
        save_checkpoint(&original, &path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(loaded.metadata.model_type, "lstm");
        assert_eq!(loaded.metadata.epoch, 2);
        assert_eq!(loaded.metadata.val_loss, Some(6.47));
        assert_eq!(loaded.params, original.params);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_checkpoint("nonexistent.json").is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_checkpoint("model.pth").unwrap_err();
        assert!(err.to_string().contains("pth"));
    }

    #[test]
    fn test_no_extension() {
        assert!(load_checkpoint("model_without_extension").is_err());
    }

    #[test]
    fn test_corrupt_safetensors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        std::fs::write(&path, b"not valid safetensors binary data").unwrap();
        assert!(load_checkpoint(&path).is_err());
    }

    #[test]
    fn test_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ invalid json }").unwrap();
        assert!(load_checkpoint(&path).is_err());
    }

    #[test]
    fn test_loads_into_model() {
        use crate::model::{Forecaster, LstmConfig, LstmRegressor};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lstm.safetensors");

        let config = LstmConfig {
            window: 4,
            input_size: 1,
            hidden_size: 3,
            output_size: 1,
        };
        let trained = LstmRegressor::new(config.clone());
        let checkpoint = Checkpoint::new(
            CheckpointMetadata::new("lstm", 1),
            trained.export_params(),
        );
        save_checkpoint(&checkpoint, &path).unwrap();

        let mut fresh = LstmRegressor::new(config);
        let loaded = load_checkpoint(&path).unwrap();
        fresh.load_params(&loaded.params).unwrap();

        let x = ndarray::Array2::from_shape_fn((2, 4), |(r, c)| (r + c) as f32);
        assert_eq!(trained.forward(&x).unwrap(), fresh.forward(&x).unwrap());
    }
}
