//! Error types shared by every crate in the workspace

use thiserror::Error;

/// Core error type
///
/// Remote-service variants (`Llm`, `Stt`, `TextAnalysis`) are produced by the
/// service clients and are expected to be caught by the analyzers. Only
/// `InvalidConfig` is meant to reach callers of an analyzer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Speech-to-text error: {0}")]
    Stt(String),

    #[error("Text analysis error: {0}")]
    TextAnalysis(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// Whether this error came from an external service rather than the caller
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Llm(_) | Error::Stt(_) | Error::TextAnalysis(_) | Error::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;
