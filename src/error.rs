//! Crate-wide error types

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while loading checkpoints, building models, or evaluating
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Unknown model type '{name}' (known: {known})")]
    UnknownModel { name: String, known: String },

    #[error("{name}: shape mismatch — got {got} elements, expected {expected}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Missing parameter '{0}'")]
    MissingParameter(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a shape mismatch tied to a named tensor
    pub fn shape(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ShapeMismatch {
            name: name.into(),
            expected,
            got,
        }
    }
}
