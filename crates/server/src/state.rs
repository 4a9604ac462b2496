//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tutor_assessment::{EncouragementPicker, Lexicon, TurnAssessor};
use tutor_config::Settings;
use tutor_core::{LanguageModel, SpeechToText, TextAnalysisService};
use tutor_llm::LlmFactory;
use tutor_pipeline::{HttpSpeechToText, HttpSttConfig, HttpTextAnalysis, HttpTextAnalysisConfig};

use crate::ServerError;

/// Which remote services were wired at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub language_model: bool,
    pub speech_to_text: bool,
    pub text_analysis: bool,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub assessor: Arc<TurnAssessor>,
    pub encouragement: Arc<EncouragementPicker>,
    pub services: ServiceStatus,
    /// Present when the Prometheus recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, assessor: TurnAssessor, services: ServiceStatus) -> Self {
        Self {
            settings: Arc::new(settings),
            assessor: Arc::new(assessor),
            encouragement: Arc::new(EncouragementPicker::new()),
            services,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_encouragement(mut self, picker: EncouragementPicker) -> Self {
        self.encouragement = Arc::new(picker);
        self
    }

    /// Build the service clients and analyzers described by `settings`
    ///
    /// Disabled services are left out; the analyzers fall back to their
    /// local checks for those signals.
    pub fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let llm: Option<Arc<dyn LanguageModel>> = LlmFactory::create(&settings.llm)
            .map_err(|e| ServerError::Startup(format!("language model: {}", e)))?;

        let stt: Option<Arc<dyn SpeechToText>> = if settings.services.stt.enabled {
            let client = HttpSpeechToText::new(HttpSttConfig::from(&settings.services.stt))
                .map_err(|e| ServerError::Startup(format!("speech-to-text: {}", e)))?;
            tracing::info!(endpoint = %settings.services.stt.endpoint, "Speech-to-text configured");
            Some(Arc::new(client))
        } else {
            tracing::info!("Speech-to-text disabled, fluency uses upstream transcripts only");
            None
        };

        let text_analysis: Option<Arc<dyn TextAnalysisService>> =
            if settings.services.text_analysis.enabled {
                let client = HttpTextAnalysis::new(HttpTextAnalysisConfig::from(
                    &settings.services.text_analysis,
                ))
                .map_err(|e| ServerError::Startup(format!("text analysis: {}", e)))?;
                tracing::info!(
                    endpoint = %settings.services.text_analysis.endpoint,
                    "Text analysis configured"
                );
                Some(Arc::new(client))
            } else {
                tracing::info!("Text analysis disabled");
                None
            };

        let lexicon = match &settings.lexicon_path {
            Some(path) => Lexicon::from_yaml_file(path)
                .map_err(|e| ServerError::Startup(e.to_string()))?,
            None => Lexicon::builtin(),
        };
        tracing::info!(words = lexicon.len(), "Lexicon loaded");

        let services = ServiceStatus {
            language_model: llm.is_some(),
            speech_to_text: stt.is_some(),
            text_analysis: text_analysis.is_some(),
        };
        let assessor = TurnAssessor::from_services(
            &settings.scoring,
            Arc::new(lexicon),
            llm,
            stt,
            text_analysis,
        );

        Ok(Self::new(settings, assessor, services))
    }
}
