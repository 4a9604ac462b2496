//! LLM factory
//!
//! Creates a `LanguageModel` from settings. Returns `None` when the language
//! model is disabled so analyzers run on local rules only.
//!
//! ## Supported Providers
//! - **Ollama**: local models
//! - **OpenAI**: OpenAI API or any compatible server

use std::str::FromStr;
use std::sync::Arc;

use tutor_config::LlmSettings;
use tutor_core::LanguageModel;

use crate::{
    adapter::LanguageModelAdapter,
    backend::{LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend},
    LlmError,
};

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    Ollama,
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(LlmProvider::Ollama),
            "openai" | "gpt" => Ok(LlmProvider::OpenAI),
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM provider '{}'",
                other
            ))),
        }
    }
}

/// Factory for creating LLM backends
pub struct LlmFactory;

impl LlmFactory {
    /// Create a LanguageModel from settings, `None` when disabled
    pub fn create(
        settings: &LlmSettings,
    ) -> Result<Option<Arc<dyn LanguageModel>>, LlmError> {
        if !settings.enabled {
            tracing::info!("Language model disabled, critiques will use local rules only");
            return Ok(None);
        }

        let backend = Self::create_backend(settings)?;
        tracing::info!(
            provider = %settings.provider,
            model = %backend.model_name(),
            "Language model configured"
        );
        Ok(Some(Arc::new(LanguageModelAdapter::from_arc(backend))))
    }

    /// Create a raw backend without the core adapter
    pub fn create_backend(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let provider: LlmProvider = settings.provider.parse()?;
        let mut config = LlmConfig::from(settings);

        match provider {
            LlmProvider::Ollama => Ok(Arc::new(OllamaBackend::new(config)?)),
            LlmProvider::OpenAI => {
                if config.api_key.is_none() {
                    config.api_key = std::env::var("OPENAI_API_KEY").ok();
                }
                Ok(Arc::new(OpenAIBackend::new(config)?))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("claude".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_disabled_returns_none() {
        let settings = LlmSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(LlmFactory::create(&settings).unwrap().is_none());
    }

    #[test]
    fn test_create_ollama() {
        let settings = LlmSettings::default();
        let llm = LlmFactory::create(&settings).unwrap().unwrap();
        assert_eq!(llm.model_name(), settings.model);
    }

    #[test]
    fn test_create_local_openai_without_key() {
        let settings = LlmSettings {
            provider: "openai".to_string(),
            endpoint: "http://localhost:8000/v1".to_string(),
            model: "local-model".to_string(),
            ..Default::default()
        };
        let backend = LlmFactory::create_backend(&settings).unwrap();
        assert_eq!(backend.model_name(), "local-model");
    }
}
