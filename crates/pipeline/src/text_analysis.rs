//! HTTP text analysis client
//!
//! The sidecar exposes three independent JSON endpoints:
//!
//! ```text
//! POST {endpoint}/syntax       {"text","language"} -> {"tokens": [...]}
//! POST {endpoint}/entities     {"text","language"} -> {"entities": [...]}
//! POST {endpoint}/key-phrases  {"text","language"} -> {"key_phrases": [...]}
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tutor_config::constants::{endpoints, timeouts};
use tutor_config::ServiceEndpoint;
use tutor_core::{Entity, Error, KeyPhrase, Result, SyntaxToken, TextAnalysisService};

use crate::{build_client, PipelineError};

#[derive(Debug, Clone)]
pub struct HttpTextAnalysisConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for HttpTextAnalysisConfig {
    fn default() -> Self {
        Self {
            url: endpoints::TEXT_ANALYSIS_DEFAULT.to_string(),
            timeout_ms: timeouts::TEXT_ANALYSIS_REQUEST_MS,
        }
    }
}

impl From<&ServiceEndpoint> for HttpTextAnalysisConfig {
    fn from(endpoint: &ServiceEndpoint) -> Self {
        Self {
            url: endpoint.endpoint.trim_end_matches('/').to_string(),
            timeout_ms: endpoint.timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct SyntaxResponse {
    #[serde(default)]
    tokens: Vec<SyntaxToken>,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct KeyPhrasesResponse {
    #[serde(default)]
    key_phrases: Vec<KeyPhrase>,
}

/// Text analysis over HTTP
pub struct HttpTextAnalysis {
    config: HttpTextAnalysisConfig,
    client: reqwest::Client,
}

impl HttpTextAnalysis {
    pub fn new(config: HttpTextAnalysisConfig) -> std::result::Result<Self, PipelineError> {
        let client = build_client(config.timeout_ms)?;
        tracing::info!(url = %config.url, "HTTP text analysis client configured");
        Ok(Self { config, client })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        text: &str,
        language: &str,
    ) -> std::result::Result<T, PipelineError> {
        let response = self
            .client
            .post(format!("{}{}", self.config.url, path))
            .json(&AnalysisRequest { text, language })
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

fn to_core(err: PipelineError) -> Error {
    Error::TextAnalysis(err.to_string())
}

#[async_trait]
impl TextAnalysisService for HttpTextAnalysis {
    async fn analyze_syntax(&self, text: &str, language: &str) -> Result<Vec<SyntaxToken>> {
        let response: SyntaxResponse = self.post("/syntax", text, language).await.map_err(to_core)?;
        Ok(response.tokens)
    }

    async fn detect_entities(&self, text: &str, language: &str) -> Result<Vec<Entity>> {
        let response: EntitiesResponse =
            self.post("/entities", text, language).await.map_err(to_core)?;
        Ok(response.entities)
    }

    async fn detect_key_phrases(&self, text: &str, language: &str) -> Result<Vec<KeyPhrase>> {
        let response: KeyPhrasesResponse =
            self.post("/key-phrases", text, language).await.map_err(to_core)?;
        Ok(response.key_phrases)
    }

    fn service_name(&self) -> &str {
        "http-text-analysis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_sidecar;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tutor_core::PartOfSpeech;

    fn client(url: String) -> HttpTextAnalysis {
        HttpTextAnalysis::new(HttpTextAnalysisConfig {
            url,
            timeout_ms: 2_000,
        })
        .unwrap()
    }

    fn sidecar() -> Router {
        Router::new()
            .route(
                "/syntax",
                post(|Json(body): Json<serde_json::Value>| async move {
                    let tokens: Vec<serde_json::Value> = body["text"]
                        .as_str()
                        .unwrap_or_default()
                        .split_whitespace()
                        .enumerate()
                        .map(|(i, word)| {
                            serde_json::json!({
                                "text": word,
                                "part_of_speech": if i == 0 { "PRON" } else { "VERB" },
                                "begin_offset": 0
                            })
                        })
                        .collect();
                    Json(serde_json::json!({ "tokens": tokens }))
                }),
            )
            .route(
                "/entities",
                post(|| async {
                    Json(serde_json::json!({"entities": [{
                        "text": "Paris", "type": "LOCATION", "confidence": 0.98,
                        "begin_offset": 9, "end_offset": 14
                    }]}))
                }),
            )
            .route(
                "/key-phrases",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
            )
    }

    #[tokio::test]
    async fn test_syntax_and_entities() {
        let url = spawn_sidecar(sidecar()).await;
        let service = client(url);

        let tokens = service.analyze_syntax("I travel", "en").await.unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].part_of_speech, PartOfSpeech::Pron);
        assert!(tokens[1].part_of_speech.is_verb());

        let entities = service.detect_entities("I visited Paris", "en").await.unwrap();
        assert_eq!(entities[0].entity_type, "LOCATION");
    }

    #[tokio::test]
    async fn test_http_failure_maps_to_text_analysis_error() {
        let url = spawn_sidecar(sidecar()).await;
        let err = client(url)
            .detect_key_phrases("anything", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TextAnalysis(msg) if msg.contains("503")));
    }

    #[test]
    fn test_config_from_endpoint() {
        let endpoint = ServiceEndpoint::new("http://nlp:8091", 750);
        let config = HttpTextAnalysisConfig::from(&endpoint);
        assert_eq!(config.url, "http://nlp:8091");
        assert_eq!(config.timeout_ms, 750);
    }
}
