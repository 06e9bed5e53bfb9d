//! Crate-wide error type

/// Errors raised by the decoder, the oracle and the Markov engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vocabulary mapping is not dense or lacks a reserved symbol.
    #[error("vocabulary error: {0}")]
    Vocab(String),

    /// Oracle returned (or was given) a batch of the wrong shape.
    #[error("oracle shape mismatch: {0}")]
    OracleShape(String),

    #[error("beam width must be at least 1")]
    InvalidBeamWidth,

    /// Weight bundle is missing a required tensor.
    #[error("model weights missing tensor `{0}`")]
    MissingTensor(String),

    /// Markov model file is structurally invalid.
    #[error("markov model format error: {0}")]
    Format(String),

    /// Neither explicit nor default fusion weights were available.
    #[error("no fusion weights given and the model has no default weights")]
    NoWeights,

    /// Generation kept hitting END before reaching the minimum length.
    #[error("failed to generate at least {min_length} symbols in {attempts} attempts")]
    MinLengthUnsatisfied { min_length: usize, attempts: usize },

    #[error("sampling error: {0}")]
    Sampling(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
