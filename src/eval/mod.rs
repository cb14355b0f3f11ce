//! Evaluation loop
//!
//! Drives a [`Forecaster`](crate::model::Forecaster) over a held-out
//! dataset: pulls batches, runs inference, optionally rescales predictions
//! back to raw units, and averages a criterion across the pass.

mod evaluator;

pub use evaluator::{evaluate, EvalOptions};
