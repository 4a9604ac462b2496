//! HTTP Endpoints
//!
//! REST API for turn assessment and the individual analyzers.

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tutor_assessment::{FluencyResult, GrammarResult, TurnAssessment, VocabularyResult};
use tutor_core::{
    AnalysisConfig, AudioClip, Channels, ConversationContext, TranscriptResult, Utterance,
};

use crate::metrics::{metrics_handler, record_http_request};
use crate::state::AppState;
use crate::ServerError;

/// Base64 PCM16 audio inflates uploads by a third
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .route("/api/assess", post(assess))
        .route("/api/assess/grammar", post(assess_grammar))
        .route("/api/assess/vocabulary", post(assess_vocabulary))
        .route("/api/assess/fluency", post(assess_fluency))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Recorded audio attached to a request
#[derive(Debug, Deserialize)]
pub struct AudioPayload {
    /// Base64 of little-endian PCM16 samples
    pub pcm16: String,
    pub sample_rate: u32,
    #[serde(default)]
    pub channels: Channels,
}

impl AudioPayload {
    fn decode(&self) -> Result<AudioClip, ServerError> {
        if self.sample_rate == 0 {
            return Err(ServerError::InvalidRequest(
                "sample_rate must be positive".to_string(),
            ));
        }
        let bytes = BASE64
            .decode(self.pcm16.as_bytes())
            .map_err(|e| ServerError::InvalidRequest(format!("Invalid base64 audio: {}", e)))?;
        Ok(AudioClip::from_pcm16_le(&bytes, self.sample_rate, self.channels))
    }
}

/// Body shared by every assessment endpoint
#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    pub text: String,
    #[serde(default)]
    pub audio: Option<AudioPayload>,
    /// Transcript from an upstream STT pass, skips the local STT call
    #[serde(default)]
    pub transcript: Option<TranscriptResult>,
    /// Overrides `config.language`
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub context: ConversationContext,
    #[serde(default)]
    pub config: AnalysisConfig,
}

impl AssessRequest {
    fn analysis_config(&self) -> AnalysisConfig {
        match &self.language {
            Some(language) => AnalysisConfig {
                language: language.clone(),
                ..self.config.clone()
            },
            None => self.config.clone(),
        }
    }

    fn audio_clip(&self) -> Result<Option<AudioClip>, ServerError> {
        self.audio.as_ref().map(AudioPayload::decode).transpose()
    }

    fn into_utterance(self) -> Result<(Utterance, AnalysisConfig), ServerError> {
        let config = self.analysis_config();
        let audio = self.audio_clip()?;

        let mut utterance = Utterance::new(self.text)
            .with_language(config.language.clone())
            .with_context(self.context);
        if let Some(audio) = audio {
            utterance = utterance.with_audio(audio);
        }
        if let Some(transcript) = self.transcript {
            utterance = utterance.with_transcript(transcript);
        }
        Ok((utterance, config))
    }
}

#[derive(Debug, Serialize)]
pub struct AssessResponse {
    #[serde(flatten)]
    pub assessment: TurnAssessment,
    pub degraded_services: Vec<String>,
    pub encouragement: &'static str,
}

fn finish<T>(route: &'static str, result: Result<T, ServerError>) -> Result<Json<T>, ServerError> {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => StatusCode::from(e),
    };
    record_http_request(route, status);
    result.map(Json)
}

/// POST /api/assess
async fn assess(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<AssessResponse>, ServerError> {
    let result = async {
        let (utterance, config) = request.into_utterance()?;
        let assessment = state.assessor.assess(&utterance, &config).await?;
        let encouragement = state.encouragement.pick(assessment.overall_score);
        Ok::<_, ServerError>(AssessResponse {
            degraded_services: assessment.degraded_services(),
            assessment,
            encouragement,
        })
    }
    .await;
    finish("assess", result)
}

/// POST /api/assess/grammar
async fn assess_grammar(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<GrammarResult>, ServerError> {
    let config = request.analysis_config();
    let result = state
        .assessor
        .grammar()
        .analyze(&request.text, &request.context, &config)
        .await
        .map_err(ServerError::from);
    finish("grammar", result)
}

/// POST /api/assess/vocabulary
async fn assess_vocabulary(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<VocabularyResult>, ServerError> {
    let config = request.analysis_config();
    let result = state
        .assessor
        .vocabulary()
        .analyze(&request.text, &request.context, &config)
        .await
        .map_err(ServerError::from);
    finish("vocabulary", result)
}

/// POST /api/assess/fluency
async fn assess_fluency(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<FluencyResult>, ServerError> {
    let result = async {
        let config = request.analysis_config();
        let audio = request.audio_clip()?;
        let fluency = state
            .assessor
            .fluency()
            .analyze_fluency_with_transcript(
                audio.as_ref(),
                &request.text,
                request.transcript.as_ref(),
                &request.context,
                &config,
            )
            .await?;
        Ok::<_, ServerError>(fluency)
    }
    .await;
    finish("fluency", result)
}

/// GET /health
///
/// Always healthy while the process serves requests; missing services only
/// lower assessment confidence.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let check = |configured: bool| {
        serde_json::json!({ "status": if configured { "configured" } else { "disabled" } })
    };
    let services = state.services;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.settings.environment,
            "checks": {
                "language_model": check(services.language_model),
                "speech_to_text": check(services.speech_to_text),
                "text_analysis": check(services.text_analysis),
                "metrics": check(state.metrics.is_some()),
            }
        })),
    )
}
