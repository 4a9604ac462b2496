//! Per-turn composite assessment
//!
//! Runs the three analyzers concurrently on one utterance and folds their
//! results into a weighted overall score. The analyzers stay independent;
//! none of them sees another's output.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutor_config::{CompositeScoring, ScoringSettings};
use tutor_core::{
    AnalysisConfig, DetectedIssue, LanguageModel, SpeechToText, TextAnalysisService, Utterance,
};
use uuid::Uuid;

use crate::error::AssessmentError;
use crate::fluency::{FluencyAnalyzer, FluencyResult};
use crate::grammar::{GrammarAnalyzer, GrammarResult};
use crate::scoring::{clamp_unit, rank_and_truncate, weighted_mean, AnalysisResult};
use crate::vocabulary::{Lexicon, VocabularyAnalyzer, VocabularyResult};

const MAX_HIGHLIGHTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnAssessment {
    pub id: Uuid,
    pub overall_score: f32,
    /// Mean of the three analyzer confidences
    pub confidence: f32,
    pub grammar: GrammarResult,
    pub vocabulary: VocabularyResult,
    pub fluency: FluencyResult,
    /// Top issues across all three analyzers
    pub highlights: Vec<DetectedIssue>,
    pub timestamp: DateTime<Utc>,
}

impl TurnAssessment {
    pub fn degraded_services(&self) -> Vec<String> {
        let mut services: Vec<String> = self
            .grammar
            .degraded_services()
            .iter()
            .chain(self.vocabulary.degraded_services())
            .chain(self.fluency.degraded_services())
            .cloned()
            .collect();
        services.sort();
        services.dedup();
        services
    }
}

pub struct TurnAssessor {
    grammar: Arc<GrammarAnalyzer>,
    vocabulary: Arc<VocabularyAnalyzer>,
    fluency: Arc<FluencyAnalyzer>,
    weights: CompositeScoring,
}

impl TurnAssessor {
    pub fn new(
        grammar: Arc<GrammarAnalyzer>,
        vocabulary: Arc<VocabularyAnalyzer>,
        fluency: Arc<FluencyAnalyzer>,
        weights: CompositeScoring,
    ) -> Self {
        Self {
            grammar,
            vocabulary,
            fluency,
            weights,
        }
    }

    /// Build all three analyzers, sharing whichever service clients exist
    pub fn from_services(
        scoring: &ScoringSettings,
        lexicon: Arc<Lexicon>,
        llm: Option<Arc<dyn LanguageModel>>,
        stt: Option<Arc<dyn SpeechToText>>,
        text_analysis: Option<Arc<dyn TextAnalysisService>>,
    ) -> Self {
        let mut grammar = GrammarAnalyzer::new(scoring.grammar.clone());
        let mut vocabulary = VocabularyAnalyzer::new(scoring.vocabulary.clone(), lexicon);
        let mut fluency = FluencyAnalyzer::new(scoring.fluency.clone());

        if let Some(llm) = llm {
            grammar = grammar.with_language_model(llm.clone());
            vocabulary = vocabulary.with_language_model(llm.clone());
            fluency = fluency.with_language_model(llm);
        }
        if let Some(service) = text_analysis {
            grammar = grammar.with_text_analysis(service.clone());
            vocabulary = vocabulary.with_text_analysis(service);
        }
        if let Some(stt) = stt {
            fluency = fluency.with_speech_to_text(stt);
        }

        Self::new(
            Arc::new(grammar),
            Arc::new(vocabulary),
            Arc::new(fluency),
            scoring.composite.clone(),
        )
    }

    pub fn grammar(&self) -> &GrammarAnalyzer {
        &self.grammar
    }

    pub fn vocabulary(&self) -> &VocabularyAnalyzer {
        &self.vocabulary
    }

    pub fn fluency(&self) -> &FluencyAnalyzer {
        &self.fluency
    }

    /// Assess one turn
    ///
    /// The utterance's language code replaces the one in `config`.
    pub async fn assess(
        &self,
        utterance: &Utterance,
        config: &AnalysisConfig,
    ) -> Result<TurnAssessment, AssessmentError> {
        let config = AnalysisConfig {
            language: utterance.language().to_string(),
            ..config.clone()
        };
        config.validate()?;

        let text = utterance.text();
        let context = utterance.context();
        let (grammar, vocabulary, fluency) = tokio::join!(
            self.grammar.analyze(text, context, &config),
            self.vocabulary.analyze(text, context, &config),
            self.fluency.analyze_fluency_with_transcript(
                utterance.audio(),
                text,
                utterance.transcript(),
                context,
                &config
            )
        );
        let (grammar, vocabulary, fluency) = (grammar?, vocabulary?, fluency?);

        let overall_score = weighted_mean(&[
            (self.weights.grammar_weight, grammar.grammar_score),
            (self.weights.vocabulary_weight, vocabulary.vocabulary_score),
            (self.weights.fluency_weight, fluency.fluency_score),
        ]);
        let confidence = clamp_unit(
            (grammar.confidence() + vocabulary.confidence() + fluency.confidence()) / 3.0,
        );

        let candidates: Vec<DetectedIssue> = grammar
            .issues
            .iter()
            .cloned()
            .chain(vocabulary.suggestions.iter().map(|s| s.to_issue()))
            .chain(fluency.pronunciation_guides.iter().cloned())
            .collect();
        let (highlights, _) = rank_and_truncate(candidates, MAX_HIGHLIGHTS);

        tracing::info!(
            overall = overall_score,
            confidence,
            degraded = grammar.is_degraded() || vocabulary.is_degraded() || fluency.is_degraded(),
            "Turn assessed"
        );

        Ok(TurnAssessment {
            id: Uuid::new_v4(),
            overall_score,
            confidence,
            grammar,
            vocabulary,
            fluency,
            highlights,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::{ConversationContext, ProficiencyLevel};

    fn assessor() -> TurnAssessor {
        TurnAssessor::from_services(
            &ScoringSettings::default(),
            Arc::new(Lexicon::builtin()),
            None,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn test_assess_combines_all_three() {
        let utterance = Utterance::new("He don't like the big house.")
            .with_context(ConversationContext::new(ProficiencyLevel::Beginner));
        let assessment = assessor()
            .assess(&utterance, &AnalysisConfig::default())
            .await
            .unwrap();

        assert!(assessment.overall_score > 0.0 && assessment.overall_score <= 1.0);
        assert!(!assessment.highlights.is_empty());
        assert!(assessment.highlights.len() <= MAX_HIGHLIGHTS);
        assert!(assessment
            .highlights
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert!(assessment.degraded_services().is_empty());
    }

    #[tokio::test]
    async fn test_blank_utterance() {
        let assessment = assessor()
            .assess(&Utterance::new(""), &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(assessment.overall_score, 0.0);
        assert_eq!(assessment.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_language_rejected() {
        let utterance = Utterance::new("Hello.").with_language("  ");
        let err = assessor()
            .assess(&utterance, &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidConfig(_)));
    }
}
