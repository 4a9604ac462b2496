//! Fluency analyzer

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutor_config::constants::messages;
use tutor_config::FluencyScoring;
use tutor_core::{
    AnalysisConfig, AudioClip, ConversationContext, DetectedIssue, LanguageModel,
    ProficiencyLevel, SpeechToText, TranscriptResult,
};

use super::pronunciation::{self, PronunciationAnalysis};
use super::rhythm::{analyze_rhythm, RhythmAnalysis};
use crate::critique::{self, FluencyCritique};
use crate::error::AssessmentError;
use crate::metrics;
use crate::scoring::{clamp_unit, weighted_mean, AnalysisResult, Confidence, Remote};
use crate::tokenize;

const ANALYZER: &str = "fluency";
const SERVICE_STT: &str = "speech_to_text";
const SERVICE_LLM: &str = "language_model";

const TOO_QUICKLY: &str = "You are speaking too quickly; slow down a little so every word is clear.";
const TOO_SLOWLY: &str = "You are speaking too slowly; try to keep a steadier pace.";
const TEXT_ONLY: &str = "Text-only input: pronunciation and pace were not assessed.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluencyResult {
    pub fluency_score: f32,
    /// Exactly 0.0 without audio
    pub pronunciation_score: f32,
    pub rhythm_score: f32,
    /// Exactly 0.0 without audio
    pub pace_score: f32,
    pub words_per_minute: f32,
    pub duration_secs: f32,
    pub transcription_confidence: Option<f32>,
    /// Model estimate, or the fallback partial score
    pub holistic_score: f32,
    pub confidence: f32,
    pub feedback: Vec<String>,
    pub pronunciation_guides: Vec<DetectedIssue>,
    pub has_audio: bool,
    pub degraded_services: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl FluencyResult {
    fn no_text(has_audio: bool) -> Self {
        Self {
            fluency_score: 0.0,
            pronunciation_score: 0.0,
            rhythm_score: 0.0,
            pace_score: 0.0,
            words_per_minute: 0.0,
            duration_secs: 0.0,
            transcription_confidence: None,
            holistic_score: 0.0,
            confidence: 0.0,
            feedback: vec![messages::NO_TEXT.to_string()],
            pronunciation_guides: Vec::new(),
            has_audio,
            degraded_services: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

impl AnalysisResult for FluencyResult {
    fn scores(&self) -> Vec<(&'static str, f32)> {
        vec![
            ("fluency", self.fluency_score),
            ("pronunciation", self.pronunciation_score),
            ("rhythm", self.rhythm_score),
            ("pace", self.pace_score),
            ("holistic", self.holistic_score),
        ]
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn degraded_services(&self) -> &[String] {
        &self.degraded_services
    }
}

/// Pace from words per minute: 1.0 inside the optimal band
struct Pace {
    score: f32,
    feedback: Option<&'static str>,
}

pub struct FluencyAnalyzer {
    scoring: FluencyScoring,
    llm: Option<Arc<dyn LanguageModel>>,
    stt: Option<Arc<dyn SpeechToText>>,
}

impl FluencyAnalyzer {
    pub fn new(scoring: FluencyScoring) -> Self {
        Self {
            scoring,
            llm: None,
            stt: None,
        }
    }

    pub fn with_language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_speech_to_text(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn analyze_rhythm(&self, text: &str) -> RhythmAnalysis {
        analyze_rhythm(text)
    }

    /// Pronunciation from a known transcription confidence
    ///
    /// Returns a zero score without audio, and the fallback partial score
    /// when audio exists but `transcript_confidence` is `None`.
    pub fn analyze_pronunciation(
        &self,
        audio: Option<&AudioClip>,
        text: &str,
        transcript_confidence: Option<f32>,
        level: ProficiencyLevel,
    ) -> PronunciationAnalysis {
        pronunciation::analyze(&self.scoring, audio, text, transcript_confidence, level)
    }

    pub async fn analyze_fluency(
        &self,
        audio: Option<&AudioClip>,
        text: &str,
        context: &ConversationContext,
        config: &AnalysisConfig,
    ) -> Result<FluencyResult, AssessmentError> {
        self.analyze_fluency_with_transcript(audio, text, None, context, config)
            .await
    }

    /// Like [`analyze_fluency`](Self::analyze_fluency) with an upstream
    /// transcript, which skips the speech-to-text call
    pub async fn analyze_fluency_with_transcript(
        &self,
        audio: Option<&AudioClip>,
        text: &str,
        transcript: Option<&TranscriptResult>,
        context: &ConversationContext,
        config: &AnalysisConfig,
    ) -> Result<FluencyResult, AssessmentError> {
        config.validate()?;
        metrics::record_request(ANALYZER);
        let audio = audio.filter(|clip| !clip.is_empty());
        let word_count = tokenize::word_count(text);
        if word_count == 0 {
            return Ok(FluencyResult::no_text(audio.is_some()));
        }
        let started = Instant::now();
        let level = config.effective_target(context);

        let duration_secs = audio.map_or(0.0, |clip| clip.duration().as_secs_f32());
        let words_per_minute = if duration_secs > 0.0 {
            word_count as f32 / (duration_secs / 60.0)
        } else {
            0.0
        };

        let (stt, critique) = tokio::join!(
            self.transcription_confidence(audio, transcript, &config.language),
            self.fetch_critique(
                text,
                context,
                level,
                audio.map(|_| words_per_minute),
                config.enable_contextual_analysis
            )
        );

        let mut confidence =
            Confidence::new(self.scoring.baseline_confidence, self.scoring.min_confidence);
        let mut degraded_services = Vec::new();
        let mut feedback = Vec::new();

        for (service, outcome) in [(SERVICE_STT, stt.outcome()), (SERVICE_LLM, critique.outcome())] {
            confidence.remote(
                outcome,
                self.scoring.remote_success_bonus,
                self.scoring.remote_failure_penalty,
            );
            if outcome == Some(false) {
                degraded_services.push(service.to_string());
            }
        }

        let rhythm = analyze_rhythm(text);
        let transcription_confidence = stt.ok().map(clamp_unit);
        let pronunciation = self.analyze_pronunciation(audio, text, transcription_confidence, level);

        let (local_score, pace_score) = match audio {
            Some(_) => {
                if duration_secs < self.scoring.min_audio_secs {
                    confidence.lower(self.scoring.short_audio_penalty);
                    feedback.push(messages::AUDIO_TOO_SHORT.to_string());
                } else if words_per_minute < self.scoring.mismatch_wpm_min
                    || words_per_minute > self.scoring.mismatch_wpm_max
                {
                    confidence.lower(self.scoring.mismatch_penalty);
                    feedback.push(messages::AUDIO_TEXT_MISMATCH.to_string());
                }

                let pace = self.pace(words_per_minute);
                feedback.extend(pace.feedback.map(str::to_string));
                feedback.extend(pronunciation.feedback.iter().cloned());

                let mut parts = vec![
                    (self.scoring.pronunciation_weight_for(level), pronunciation.score),
                    (self.scoring.rhythm_weight, rhythm.score),
                    (self.scoring.pace_weight, pace.score),
                ];
                if let Some(c) = transcription_confidence {
                    parts.push((self.scoring.transcription_weight, c));
                }
                (weighted_mean(&parts), pace.score)
            },
            None => {
                confidence.lower(self.scoring.text_only_penalty);
                feedback.push(TEXT_ONLY.to_string());
                (rhythm.score, 0.0)
            },
        };

        let holistic_score = match critique.ok() {
            Some(critique) => {
                feedback.extend(critique.feedback.into_iter().filter(|f| !f.trim().is_empty()));
                clamp_unit(critique.fluency_score)
            },
            None => self.scoring.fallback_score,
        };
        let holistic_weight = self.scoring.holistic_weight;
        let fluency_score =
            clamp_unit((1.0 - holistic_weight) * local_score + holistic_weight * holistic_score);

        tracing::debug!(
            score = fluency_score,
            wpm = words_per_minute,
            has_audio = audio.is_some(),
            "Fluency analysis complete"
        );
        metrics::record_latency(ANALYZER, started.elapsed());

        Ok(FluencyResult {
            fluency_score,
            pronunciation_score: pronunciation.score,
            rhythm_score: rhythm.score,
            pace_score: clamp_unit(pace_score),
            words_per_minute,
            duration_secs,
            transcription_confidence,
            holistic_score,
            confidence: confidence.value(),
            feedback,
            pronunciation_guides: pronunciation.guides,
            has_audio: audio.is_some(),
            degraded_services,
            timestamp: Utc::now(),
        })
    }

    fn pace(&self, words_per_minute: f32) -> Pace {
        let (min, max) = (self.scoring.optimal_wpm_min, self.scoring.optimal_wpm_max);
        if words_per_minute < min {
            Pace {
                score: clamp_unit(words_per_minute / min),
                feedback: Some(TOO_SLOWLY),
            }
        } else if words_per_minute > max {
            Pace {
                score: clamp_unit(1.0 - (words_per_minute - max) / max),
                feedback: Some(TOO_QUICKLY),
            }
        } else {
            Pace {
                score: 1.0,
                feedback: None,
            }
        }
    }

    /// Confidence from the upstream transcript, or from the STT service
    async fn transcription_confidence(
        &self,
        audio: Option<&AudioClip>,
        transcript: Option<&TranscriptResult>,
        language: &str,
    ) -> Remote<f32> {
        let Some(audio) = audio else {
            return Remote::Skipped;
        };
        if let Some(transcript) = transcript {
            return Remote::Ok(transcript.confidence);
        }
        let Some(stt) = &self.stt else {
            return Remote::Skipped;
        };
        match stt.transcribe(audio, language).await {
            Ok(result) => Remote::Ok(result.confidence),
            Err(e) => Remote::failed(ANALYZER, SERVICE_STT, e),
        }
    }

    async fn fetch_critique(
        &self,
        text: &str,
        context: &ConversationContext,
        level: ProficiencyLevel,
        words_per_minute: Option<f32>,
        enabled: bool,
    ) -> Remote<FluencyCritique> {
        let Some(llm) = self.llm.as_ref().filter(|_| enabled) else {
            return Remote::Skipped;
        };
        let request = critique::fluency_request(text, context, level, words_per_minute);
        match critique::request_critique::<FluencyCritique>(llm.as_ref(), request).await {
            Ok(critique) => Remote::Ok(critique),
            Err(e) => Remote::failed(ANALYZER, SERVICE_LLM, e),
        }
    }
}
