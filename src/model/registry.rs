//! Model type registry
//!
//! Maps string identifiers to factories; a model is constructed only when
//! its identifier is resolved, never eagerly for the whole table.

use super::{
    Forecaster, LstmConfig, LstmRegressor, ResCnn, ResCnnConfig, StateSpace, StateSpaceConfig,
    TransformerConfig, TransformerForecaster,
};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

type Factory = Box<dyn Fn() -> Box<dyn Forecaster>>;

/// Lazy name-to-factory mapping for model construction
///
/// # Example
///
/// ```
/// use evaluar::model::ModelRegistry;
///
/// let registry = ModelRegistry::builtin();
/// let model = registry.resolve("lstm").unwrap();
/// assert_eq!(model.arch_name(), "LstmRegressor");
/// ```
pub struct ModelRegistry {
    factories: BTreeMap<String, Factory>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in model table
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("rescnn", || {
            Box::new(ResCnn::new(ResCnnConfig::univariate()))
        });
        registry.register("rescnn_ts", || {
            Box::new(ResCnn::new(ResCnnConfig::target_series()))
        });
        registry.register("s4", || {
            Box::new(StateSpace::new(StateSpaceConfig::univariate()))
        });
        registry.register("lstm", || {
            Box::new(LstmRegressor::new(LstmConfig::univariate()))
        });
        registry.register("lstm_ts", || {
            Box::new(LstmRegressor::new(LstmConfig::target_series()))
        });
        registry.register("transformer", || {
            Box::new(TransformerForecaster::simple(TransformerConfig::simple()))
        });
        registry.register("transformer_ts", || {
            Box::new(TransformerForecaster::simple(
                TransformerConfig::target_series(),
            ))
        });
        registry.register("transformer_improved", || {
            Box::new(TransformerForecaster::time_series(
                TransformerConfig::improved(),
            ))
        });
        registry.register("ThreeLayerTransformer", || {
            Box::new(TransformerForecaster::three_layer(
                TransformerConfig::three_layer(),
            ))
        });
        registry
    }

    /// Register a factory under an identifier, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Forecaster> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Construct the model registered under `name`
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Forecaster>> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownModel {
                name: name.to_string(),
                known: self.names().join(", "),
            }),
        }
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Whether an identifier is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    #[test]
    fn test_builtin_names() {
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
            assert!(registry.contains(name), "missing builtin '{name}'");
        }
        assert_eq!(registry.names().len(), 9);
    }

    #[test]
    fn test_resolve_constructs_fresh_instances() {
        let registry = ModelRegistry::builtin();
        let mut first = registry.resolve("lstm").unwrap();
        first.set_mode(Mode::Eval);
        let second = registry.resolve("lstm").unwrap();
        assert_eq!(second.mode(), Mode::Train);
    }

    #[test]
    fn test_unknown_model_error_lists_known() {
        let registry = ModelRegistry::builtin();
        let err = registry.resolve("gru").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("gru"));
        assert!(msg.contains("rescnn"));
    }

    #[test]
    fn test_ts_variants_predict_whole_window() {
        let registry = ModelRegistry::builtin();
        let model = registry.resolve("rescnn_ts").unwrap();
        assert_eq!(model.window(), model.horizon());
    }

    #[test]
    fn test_custom_registration_overrides() {
        let mut registry = ModelRegistry::builtin();
        registry.register("rescnn", || {
            Box::new(LstmRegressor::new(LstmConfig::univariate()))
        });
        let model = registry.resolve("rescnn").unwrap();
        assert_eq!(model.arch_name(), "LstmRegressor");
    }
}
