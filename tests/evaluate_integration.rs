//! End-to-end evaluation tests: dataset -> checkpoint -> evaluate

use evaluar::checkpoint::{load_checkpoint, save_checkpoint, Checkpoint, CheckpointMetadata};
use evaluar::data::{BatchLoader, Dataset, DatasetKind, SeriesDataset};
use evaluar::eval::{evaluate, EvalOptions};
use evaluar::loss::{L1Loss, MSELoss};
use evaluar::model::{Mode, ModelRegistry};
use evaluar::scaler::{Scaler, StandardScaler};
use ndarray::Array2;
use std::io::Write;

fn sine_series(len: usize) -> Vec<f32> {
    (0..len).map(|i| 50.0 + 10.0 * (i as f32 * 0.1).sin()).collect()
}

fn scaled_dataset(series: &[f32], window: usize, horizon: usize) -> (SeriesDataset, StandardScaler) {
    let scaler = StandardScaler::fit_series(series);
    let column = Array2::from_shape_vec((series.len(), 1), series.to_vec()).unwrap();
    let scaled: Vec<f32> = scaler.transform(&column).unwrap().column(0).to_vec();
    (
        SeriesDataset::from_series(scaled, window, horizon).unwrap(),
        scaler,
    )
}

#[test]
fn checkpoint_round_trip_preserves_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lstm_epoch2.safetensors");

    let registry = ModelRegistry::builtin();
    let mut trained = registry.resolve("lstm").unwrap();

    let checkpoint = Checkpoint::new(
        CheckpointMetadata::new("lstm", 2).with_val_loss(0.5),
        trained.export_params(),
    );
    save_checkpoint(&checkpoint, &path).unwrap();

    let mut fresh = registry.resolve("lstm").unwrap();
    let loaded = load_checkpoint(&path).unwrap();
    assert_eq!(loaded.metadata.model_type, "lstm");
    fresh.load_params(&loaded.params).unwrap();

    let series = sine_series(120);
    let (dataset, scaler) = scaled_dataset(&series, trained.window(), trained.horizon());
    let dataset_size = dataset.len();
    let loader = BatchLoader::new(dataset, 32);
    let options = EvalOptions {
        batch_size: 32,
        dataset_size,
        dataset_kind: DatasetKind::TimeSeries,
        ..EvalOptions::default()
    };

    let loss_trained = evaluate(trained.as_mut(), &loader, &L1Loss, &scaler, &options).unwrap();
    let loss_fresh = evaluate(fresh.as_mut(), &loader, &L1Loss, &scaler, &options).unwrap();

    assert!(loss_trained.is_finite());
    assert_eq!(loss_trained, loss_fresh);
}

#[test]
fn evaluation_is_deterministic_and_restores_mode() {
    let registry = ModelRegistry::builtin();
    let mut model = registry.resolve("lstm").unwrap();

    let series = sine_series(100);
    let (dataset, scaler) = scaled_dataset(&series, model.window(), model.horizon());
    let dataset_size = dataset.len();
    let loader = BatchLoader::new(dataset, 16);
    let options = EvalOptions {
        batch_size: 16,
        dataset_size,
        dataset_kind: DatasetKind::TimeSeries,
        ..EvalOptions::default()
    };

    let first = evaluate(model.as_mut(), &loader, &MSELoss, &scaler, &options).unwrap();
    let second = evaluate(model.as_mut(), &loader, &MSELoss, &scaler, &options).unwrap();

    assert_eq!(first, second);
    assert_eq!(model.mode(), Mode::Train);
}

#[test]
fn csv_pipeline_reports_finite_loss() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("prices.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "date,close").unwrap();
    for (i, value) in sine_series(90).iter().enumerate() {
        writeln!(file, "2023-01-{:02},{value}", i % 28 + 1).unwrap();
    }
    drop(file);

    let series = evaluar::data::read_series_csv(&csv_path, "close").unwrap();
    assert_eq!(series.len(), 90);

    let registry = ModelRegistry::builtin();
    let mut model = registry.resolve("s4").unwrap();
    let (dataset, scaler) = scaled_dataset(&series, model.window(), model.horizon());
    let dataset_size = dataset.len();
    let loader = BatchLoader::new(dataset, 16);
    let options = EvalOptions {
        batch_size: 16,
        dataset_size,
        dataset_kind: DatasetKind::TimeSeries,
        ..EvalOptions::default()
    };

    let loss = evaluate(model.as_mut(), &loader, &L1Loss, &scaler, &options).unwrap();
    assert!(loss.is_finite());
    assert!(loss >= 0.0);
}

#[test]
fn builtin_models_produce_expected_shapes() {
    let registry = ModelRegistry::builtin();
    for name in [
        "rescnn",
        "rescnn_ts",
        "s4",
        "lstm",
        "lstm_ts",
        "transformer",
        "transformer_ts",
        "transformer_improved",
        "ThreeLayerTransformer",
    ] {
        let model = registry.resolve(name).unwrap();
        let features = Array2::zeros((2, model.window()));
        let prediction = model.forward(&features).unwrap();
        assert_eq!(
            prediction.dim(),
            (2, model.horizon()),
            "wrong output shape for '{name}'"
        );
    }
}

#[test]
fn autocast_changes_loss_only_slightly() {
    let registry = ModelRegistry::builtin();
    let mut model = registry.resolve("lstm").unwrap();

    let series = sine_series(100);
    let (dataset, scaler) = scaled_dataset(&series, model.window(), model.horizon());
    let dataset_size = dataset.len();
    let loader = BatchLoader::new(dataset, 16);

    let exact = EvalOptions {
        batch_size: 16,
        dataset_size,
        dataset_kind: DatasetKind::TimeSeries,
        ..EvalOptions::default()
    };
    let reduced = EvalOptions {
        autocast: true,
        ..exact.clone()
    };

    let loss_exact = evaluate(model.as_mut(), &loader, &L1Loss, &scaler, &exact).unwrap();
    let loss_reduced = evaluate(model.as_mut(), &loader, &L1Loss, &scaler, &reduced).unwrap();

    assert!(loss_reduced.is_finite());
    let spread = (loss_exact - loss_reduced).abs();
    assert!(
        spread < loss_exact.abs() * 0.2 + 1.0,
        "reduced precision drifted too far: {loss_exact} vs {loss_reduced}"
    );
}

#[test]
fn saved_predictions_match_batch_count() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::builtin();
    let mut model = registry.resolve("lstm").unwrap();

    let series = sine_series(80);
    let (dataset, scaler) = scaled_dataset(&series, model.window(), model.horizon());
    let dataset_size = dataset.len();
    let loader = BatchLoader::new(dataset, 16);
    let num_batches = loader.num_batches();

    let options = EvalOptions {
        batch_size: 16,
        dataset_size,
        dataset_kind: DatasetKind::TimeSeries,
        save_predictions: Some(dir.path().to_path_buf()),
        ..EvalOptions::default()
    };
    evaluate(model.as_mut(), &loader, &L1Loss, &scaler, &options).unwrap();

    let out_dir = dir.path().join("predictions_LstmRegressor");
    let written = std::fs::read_dir(&out_dir).unwrap().count();
    assert_eq!(written, num_batches);
}
