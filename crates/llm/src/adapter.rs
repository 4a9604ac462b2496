//! Language model adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait so the
//! analyzers never depend on a concrete backend.

use std::sync::Arc;

use async_trait::async_trait;
use tutor_core::{
    Error, FinishReason as CoreFinishReason, GenerateRequest, GenerateResponse, LanguageModel,
    Result, TokenUsage,
};

use crate::backend::{FinishReason as BackendFinishReason, GenerationOptions, LlmBackend};

/// Wraps an LlmBackend to implement the core LanguageModel trait.
///
/// # Example
///
/// ```ignore
/// let backend = OllamaBackend::new(config)?;
/// let llm: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));
/// ```
pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl LanguageModelAdapter {
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend,
            model_name,
        }
    }

    fn options_for(request: &GenerateRequest) -> GenerationOptions {
        GenerationOptions {
            max_tokens: request.max_tokens.map(|t| t as usize),
            temperature: request.temperature,
            json_output: request.json_output,
        }
    }

    fn convert_finish_reason(reason: BackendFinishReason) -> CoreFinishReason {
        match reason {
            BackendFinishReason::Stop => CoreFinishReason::Stop,
            BackendFinishReason::Length => CoreFinishReason::Length,
            BackendFinishReason::ContentFilter => CoreFinishReason::ContentFilter,
            BackendFinishReason::Error => CoreFinishReason::Error,
        }
    }
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let options = Self::options_for(&request);

        match self.backend.generate(&request.messages, &options).await {
            Ok(result) => {
                tracing::debug!(
                    model = %self.model_name,
                    latency_ms = result.total_time_ms,
                    completion_tokens = result.completion_tokens,
                    "LLM generation complete"
                );
                Ok(GenerateResponse {
                    text: result.text,
                    finish_reason: Self::convert_finish_reason(result.finish_reason),
                    usage: Some(TokenUsage::new(
                        result.prompt_tokens as u32,
                        result.completion_tokens as u32,
                    )),
                })
            },
            Err(e) => Err(Error::Llm(format!("LLM generation failed: {}", e))),
        }
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationResult;
    use crate::LlmError;
    use std::sync::Mutex;
    use tutor_core::Message;

    struct MockBackend {
        response: std::result::Result<String, String>,
        /// Message count and JSON flag of the last call
        seen: Mutex<Option<(usize, bool)>>,
    }

    impl MockBackend {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                seen: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err("connection refused".to_string()),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> std::result::Result<GenerationResult, LlmError> {
            if let Ok(mut seen) = self.seen.lock() {
                *seen = Some((messages.len(), options.json_output));
            }
            match &self.response {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    prompt_tokens: 20,
                    completion_tokens: 10,
                    total_time_ms: 100,
                    finish_reason: BackendFinishReason::Stop,
                }),
                Err(e) => Err(LlmError::Network(e.clone())),
            }
        }

        async fn is_available(&self) -> bool {
            self.response.is_ok()
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn test_adapter_generate() {
        let adapter = LanguageModelAdapter::new(MockBackend::ok(r#"{"errors":[]}"#));

        let request = GenerateRequest::new("You are a tutor")
            .with_user_message("Hi")
            .with_json_output();

        let response = adapter.generate(request).await.unwrap();
        assert_eq!(response.text, r#"{"errors":[]}"#);
        assert_eq!(response.finish_reason, CoreFinishReason::Stop);
        assert_eq!(response.usage.unwrap().completion_tokens, 10);
    }

    #[tokio::test]
    async fn test_adapter_forwards_json_flag() {
        let backend = Arc::new(MockBackend::ok("{}"));
        let adapter = LanguageModelAdapter::from_arc(backend.clone());

        adapter
            .generate(GenerateRequest::new("sys").with_user_message("u").with_json_output())
            .await
            .unwrap();

        assert_eq!(*backend.seen.lock().unwrap(), Some((2, true)));
    }

    #[tokio::test]
    async fn test_adapter_maps_errors() {
        let adapter = LanguageModelAdapter::new(MockBackend::failing());
        let err = adapter
            .generate(GenerateRequest::new("sys").with_user_message("u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
        assert!(!adapter.is_available().await);
    }

    #[test]
    fn test_adapter_model_name() {
        let adapter = LanguageModelAdapter::new(MockBackend::ok("test"));
        assert_eq!(adapter.model_name(), "mock-model");
    }
}
