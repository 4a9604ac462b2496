//! HTTP speech-to-text client
//!
//! Sends whole clips to the STT sidecar as little-endian PCM16:
//!
//! ```text
//! POST {endpoint}/transcribe
//! Content-Type: audio/pcm
//! X-Language: en
//! X-Sample-Rate: 16000
//! X-Channels: 1
//! ```
//!
//! and expects `{"text": "...", "confidence": 0.93, "alternatives": [...]}`.

use async_trait::async_trait;
use serde::Deserialize;
use tutor_config::constants::{endpoints, timeouts};
use tutor_config::ServiceEndpoint;
use tutor_core::{AudioClip, Error, Result, SpeechToText, TranscriptAlternative, TranscriptResult};

use crate::{build_client, PipelineError};

/// HTTP STT configuration
#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    /// Base URL of the STT service
    pub url: String,
    pub timeout_ms: u64,
    /// Model label reported in logs
    pub model: String,
}

impl Default for HttpSttConfig {
    fn default() -> Self {
        Self {
            url: endpoints::STT_DEFAULT.to_string(),
            timeout_ms: timeouts::STT_REQUEST_MS,
            model: "http-stt".to_string(),
        }
    }
}

impl From<&ServiceEndpoint> for HttpSttConfig {
    fn from(endpoint: &ServiceEndpoint) -> Self {
        Self {
            url: endpoint.endpoint.trim_end_matches('/').to_string(),
            timeout_ms: endpoint.timeout_ms,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    alternatives: Vec<TranscriptAlternative>,
    #[serde(default)]
    error: Option<String>,
}

/// Speech-to-text over HTTP
pub struct HttpSpeechToText {
    config: HttpSttConfig,
    client: reqwest::Client,
}

impl HttpSpeechToText {
    pub fn new(config: HttpSttConfig) -> std::result::Result<Self, PipelineError> {
        let client = build_client(config.timeout_ms)?;
        tracing::info!(url = %config.url, "HTTP STT client configured");
        Ok(Self { config, client })
    }

    async fn request(
        &self,
        audio: &AudioClip,
        language: &str,
    ) -> std::result::Result<SttResponse, PipelineError> {
        let response = self
            .client
            .post(format!("{}/transcribe", self.config.url))
            .header("Content-Type", "audio/pcm")
            .header("X-Language", language)
            .header("X-Sample-Rate", audio.sample_rate().to_string())
            .header("X-Channels", audio.channels().count().to_string())
            .body(audio.to_pcm16_le())
            .send()
            .await
            .map_err(|e| PipelineError::from_reqwest(e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(PipelineError::from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, audio: &AudioClip, language: &str) -> Result<TranscriptResult> {
        if audio.is_empty() {
            return Ok(TranscriptResult::new("", 0.0));
        }

        let response = self
            .request(audio, language)
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(Error::Stt(error));
        }

        let mut result = TranscriptResult::new(response.text, response.confidence);
        for alt in response.alternatives {
            result = result.with_alternative(alt.text, alt.confidence);
        }
        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
