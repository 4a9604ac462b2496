//! Configuration management for the assessment engine
//!
//! Supports loading configuration from:
//! - TOML/YAML files (`config/default`, `config/{env}`)
//! - Environment variables (TUTOR__ prefix, `__` separator)
//! - Runtime overrides
//!
//! The scoring section exposes every weighting constant of the analyzers as
//! a tunable; defaults reproduce the documented behaviour.

pub mod constants;
pub mod scoring;
pub mod settings;

pub use scoring::{
    CompositeScoring, FluencyScoring, GrammarScoring, ScoringSettings, VocabularyScoring,
};
pub use settings::{
    load_settings, load_settings_from, LlmSettings, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    ServiceEndpoint, ServiceSettings, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for tutor_core::Error {
    fn from(err: ConfigError) -> Self {
        tutor_core::Error::InvalidConfig(err.to_string())
    }
}
