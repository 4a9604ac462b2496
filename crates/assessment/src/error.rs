//! Assessment error types

use thiserror::Error;

/// Errors returned to analyzer callers
///
/// Remote-service failures are absorbed inside the analyzers and never
/// appear here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssessmentError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lexicon error: {0}")]
    Lexicon(String),
}

impl From<tutor_core::Error> for AssessmentError {
    fn from(err: tutor_core::Error) -> Self {
        match err {
            tutor_core::Error::InvalidConfig(msg) => AssessmentError::InvalidConfig(msg),
            other => AssessmentError::InvalidConfig(other.to_string()),
        }
    }
}

impl From<tutor_config::ConfigError> for AssessmentError {
    fn from(err: tutor_config::ConfigError) -> Self {
        AssessmentError::InvalidConfig(err.to_string())
    }
}

impl From<AssessmentError> for tutor_core::Error {
    fn from(err: AssessmentError) -> Self {
        tutor_core::Error::InvalidConfig(err.to_string())
    }
}
