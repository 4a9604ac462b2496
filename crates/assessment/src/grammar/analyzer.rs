//! Grammar analyzer

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutor_config::constants::messages;
use tutor_config::GrammarScoring;
use tutor_core::{
    AnalysisConfig, ConversationContext, DetectedIssue, IssueKind, IssueSource, LanguageModel,
    PartOfSpeech, ProficiencyLevel, Severity, SyntaxToken, TextAnalysisService, TextSpan,
};

use super::rules::RuleSet;
use crate::critique::{self, GrammarCritique};
use crate::error::AssessmentError;
use crate::metrics;
use crate::scoring::{clamp_unit, rank_and_truncate, AnalysisResult, Confidence, Remote};
use crate::tokenize;

const ANALYZER: &str = "grammar";
const SERVICE_SYNTAX: &str = "text_analysis";
const SERVICE_LLM: &str = "language_model";

/// Confidence given to model-reported errors that carry none
const DEFAULT_CRITIQUE_CONFIDENCE: f32 = 0.6;

/// Structural summary derived from the syntax service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceStructure {
    pub sentence_count: usize,
    pub token_count: usize,
    pub verb_count: usize,
    pub noun_count: usize,
    /// Coordinating and subordinating conjunctions
    pub clause_markers: usize,
}

impl SentenceStructure {
    fn from_tokens(text: &str, tokens: &[SyntaxToken]) -> Self {
        let count = |pred: fn(&PartOfSpeech) -> bool| {
            tokens.iter().filter(|t| pred(&t.part_of_speech)).count()
        };
        Self {
            sentence_count: tokenize::sentences(text).len(),
            token_count: tokens
                .iter()
                .filter(|t| t.part_of_speech != PartOfSpeech::Punct)
                .count(),
            verb_count: count(PartOfSpeech::is_verb),
            noun_count: count(PartOfSpeech::is_noun),
            clause_markers: count(|p| matches!(p, PartOfSpeech::Cconj | PartOfSpeech::Sconj)),
        }
    }
}

/// Grammar assessment for one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrammarResult {
    pub grammar_score: f32,
    /// Model estimate, or the fallback partial score
    pub fluency_estimate: f32,
    /// Model estimate, or the fallback partial score
    pub vocabulary_estimate: f32,
    pub confidence: f32,
    /// Ranked, truncated to the strictness ceiling
    pub issues: Vec<DetectedIssue>,
    pub feedback: Vec<String>,
    pub structure: Option<SentenceStructure>,
    /// Issues that counted toward the score but were cut from `issues`
    pub suppressed_issues: usize,
    pub degraded_services: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl GrammarResult {
    fn no_text() -> Self {
        Self {
            grammar_score: 0.0,
            fluency_estimate: 0.0,
            vocabulary_estimate: 0.0,
            confidence: 0.0,
            issues: vec![DetectedIssue::notice(messages::NO_TEXT)],
            feedback: vec![messages::NO_TEXT.to_string()],
            structure: None,
            suppressed_issues: 0,
            degraded_services: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

impl AnalysisResult for GrammarResult {
    fn scores(&self) -> Vec<(&'static str, f32)> {
        vec![
            ("grammar", self.grammar_score),
            ("fluency_estimate", self.fluency_estimate),
            ("vocabulary_estimate", self.vocabulary_estimate),
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

/// Rule-based grammar checks fused with remote syntax and critique signals
pub struct GrammarAnalyzer {
    rules: RuleSet,
    scoring: GrammarScoring,
    llm: Option<Arc<dyn LanguageModel>>,
    text_analysis: Option<Arc<dyn TextAnalysisService>>,
}

impl GrammarAnalyzer {
    pub fn new(scoring: GrammarScoring) -> Self {
        Self {
            rules: RuleSet::builtin(scoring.run_on_max_words),
            scoring,
            llm: None,
            text_analysis: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_text_analysis(mut self, service: Arc<dyn TextAnalysisService>) -> Self {
        self.text_analysis = Some(service);
        self
    }

    /// Assess grammar for `text`
    ///
    /// Only an invalid `config` produces an error; empty input and remote
    /// failures yield well-formed results.
    pub async fn analyze(
        &self,
        text: &str,
        context: &ConversationContext,
        config: &AnalysisConfig,
    ) -> Result<GrammarResult, AssessmentError> {
        config.validate()?;
        metrics::record_request(ANALYZER);
        if tokenize::word_count(text) == 0 {
            return Ok(GrammarResult::no_text());
        }
        let started = Instant::now();
        let level = config.effective_target(context);

        let mut issues = self.rules.check(text, &config.focus_areas);

        let (syntax, critique) = if config.enable_contextual_analysis {
            let findings: Vec<String> = issues.iter().map(|i| i.description.clone()).collect();
            tokio::join!(
                self.fetch_syntax(text, &config.language),
                self.fetch_critique(text, context, level, &findings)
            )
        } else {
            (Remote::Skipped, Remote::Skipped)
        };

        let mut confidence =
            Confidence::new(self.scoring.baseline_confidence, self.scoring.min_confidence);
        let mut degraded_services = Vec::new();
        for (service, outcome) in [
            (SERVICE_SYNTAX, syntax.outcome()),
            (SERVICE_LLM, critique.outcome()),
        ] {
            confidence.remote(
                outcome,
                self.scoring.remote_success_bonus,
                self.scoring.remote_failure_penalty,
            );
            if outcome == Some(false) {
                degraded_services.push(service.to_string());
            }
        }

        let structure = syntax
            .as_ok()
            .map(|tokens| SentenceStructure::from_tokens(text, tokens));

        let mut feedback = Vec::new();
        let (fluency_estimate, vocabulary_estimate) = match critique.ok() {
            Some(critique) => {
                let estimates = (
                    clamp_unit(critique.fluency_score),
                    clamp_unit(critique.vocabulary_score),
                );
                merge_critique_errors(text, &mut issues, critique.errors);
                feedback.extend(
                    critique
                        .contextual_feedback
                        .into_iter()
                        .filter(|f| !f.trim().is_empty()),
                );
                estimates
            },
            None => (self.scoring.fallback_score, self.scoring.fallback_score),
        };

        let grammar_score = self.score(&issues, config);
        let total_issues = issues.len();
        let (issues, suppressed_issues) =
            rank_and_truncate(issues, self.scoring.max_issues(config.strictness));

        if total_issues == 0 {
            feedback.insert(0, "No grammar issues found. Well done!".to_string());
        } else if suppressed_issues > 0 {
            feedback.push(format!(
                "{} more issue{} not shown",
                suppressed_issues,
                if suppressed_issues == 1 { "" } else { "s" }
            ));
        }

        tracing::debug!(
            score = grammar_score,
            issues = total_issues,
            suppressed = suppressed_issues,
            "Grammar analysis complete"
        );
        metrics::record_latency(ANALYZER, started.elapsed());

        Ok(GrammarResult {
            grammar_score,
            fluency_estimate: clamp_unit(fluency_estimate),
            vocabulary_estimate: clamp_unit(vocabulary_estimate),
            confidence: confidence.value(),
            issues,
            feedback,
            structure,
            suppressed_issues,
            degraded_services,
            timestamp: Utc::now(),
        })
    }

    /// 1.0 minus severity penalties over every detected issue
    fn score(&self, issues: &[DetectedIssue], config: &AnalysisConfig) -> f32 {
        let multiplier = self.scoring.strictness_multiplier(config.strictness);
        let penalty: f32 = issues
            .iter()
            .filter_map(|issue| issue.severity)
            .map(|severity| self.scoring.penalty_for(severity) * multiplier)
            .sum();
        clamp_unit(1.0 - penalty)
    }

    async fn fetch_syntax(&self, text: &str, language: &str) -> Remote<Vec<SyntaxToken>> {
        let Some(service) = &self.text_analysis else {
            return Remote::Skipped;
        };
        match service.analyze_syntax(text, language).await {
            Ok(tokens) => Remote::Ok(tokens),
            Err(e) => Remote::failed(ANALYZER, SERVICE_SYNTAX, e),
        }
    }

    async fn fetch_critique(
        &self,
        text: &str,
        context: &ConversationContext,
        level: ProficiencyLevel,
        findings: &[String],
    ) -> Remote<GrammarCritique> {
        let Some(llm) = &self.llm else {
            return Remote::Skipped;
        };
        let request = critique::grammar_request(text, context, level, findings);
        match critique::request_critique::<GrammarCritique>(llm.as_ref(), request).await {
            Ok(critique) => Remote::Ok(critique),
            Err(e) => Remote::failed(ANALYZER, SERVICE_LLM, e),
        }
    }
}

/// Add model-reported errors that do not overlap a rule hit
fn merge_critique_errors(
    text: &str,
    issues: &mut Vec<DetectedIssue>,
    errors: Vec<critique::CritiqueError>,
) {
    for error in errors {
        if error.description.trim().is_empty() {
            continue;
        }
        let span = error
            .original
            .as_deref()
            .filter(|original| !original.trim().is_empty())
            .and_then(|original| {
                text.find(original)
                    .map(|start| TextSpan::from_byte_range(text, start, start + original.len()))
            });

        let overlaps = span.is_some_and(|span| {
            issues
                .iter()
                .filter_map(|issue| issue.span)
                .any(|other| span.start < other.end && other.start < span.end)
        });
        if overlaps {
            continue;
        }

        let severity = error
            .severity
            .as_deref()
            .map(Severity::parse_lenient)
            .unwrap_or(Severity::Medium);
        let mut issue =
            DetectedIssue::new(IssueKind::Grammar, error.description, IssueSource::LanguageModel)
                .with_severity(severity)
                .with_confidence(error.confidence.unwrap_or(DEFAULT_CRITIQUE_CONFIDENCE));
        if let Some(span) = span {
            issue = issue.with_span(span);
        }
        if let Some(suggestion) = error.suggestion.filter(|s| !s.trim().is_empty()) {
            issue = issue.with_replacement(suggestion);
        }
        issues.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tutor_core::{
        Entity, Error, GenerateRequest, GenerateResponse, KeyPhrase, Result, StrictnessLevel,
    };

    struct MockLlm {
        reply: String,
        calls: AtomicUsize,
    }

    impl MockLlm {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for MockLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerateResponse::text(self.reply.clone()))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock-llm"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            Err(Error::Llm("connection refused".into()))
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn model_name(&self) -> &str {
            "failing-llm"
        }
    }

    struct MockSyntax {
        fail: bool,
    }

    #[async_trait]
    impl TextAnalysisService for MockSyntax {
        async fn analyze_syntax(&self, text: &str, _language: &str) -> Result<Vec<SyntaxToken>> {
            if self.fail {
                return Err(Error::TextAnalysis("503".into()));
            }
            let tag = |word: &str| match word {
                "He" | "it" => PartOfSpeech::Pron,
                "don't" | "like" => PartOfSpeech::Verb,
                "and" => PartOfSpeech::Cconj,
                "." => PartOfSpeech::Punct,
                _ => PartOfSpeech::Noun,
            };
            Ok(text
                .split_whitespace()
                .map(|w| SyntaxToken {
                    text: w.to_string(),
                    part_of_speech: tag(w),
                    begin_offset: 0,
                    lemma: None,
                })
                .collect())
        }

        async fn detect_entities(&self, _text: &str, _language: &str) -> Result<Vec<Entity>> {
            Ok(Vec::new())
        }

        async fn detect_key_phrases(&self, _text: &str, _language: &str) -> Result<Vec<KeyPhrase>> {
            Ok(Vec::new())
        }

        fn service_name(&self) -> &str {
            "mock-syntax"
        }
    }

    fn context() -> ConversationContext {
        ConversationContext::new(ProficiencyLevel::Intermediate)
    }

    fn analyzer() -> GrammarAnalyzer {
        GrammarAnalyzer::new(GrammarScoring::default())
    }

    #[tokio::test]
    async fn test_agreement_error_is_high_severity() {
        let result = analyzer()
            .analyze("He don't like it.", &context(), &AnalysisConfig::default())
            .await
            .unwrap();

        let issue = &result.issues[0];
        assert_eq!(issue.kind, IssueKind::Grammar);
        assert_eq!(issue.severity, Some(Severity::High));
        assert!(issue.description.contains("agreement"));
        assert!(result.grammar_score < 1.0);
        // No services configured: baseline confidence, fallback estimates
        assert!((result.confidence - 0.7).abs() < 1e-6);
        assert!((result.fluency_estimate - 0.7).abs() < 1e-6);
        assert!(result.degraded_services.is_empty());
    }

    #[tokio::test]
    async fn test_strict_scores_no_higher_than_lenient() {
        let text = "He don't have a apple and they was late.";
        let lenient = AnalysisConfig::default().with_strictness(StrictnessLevel::Lenient);
        let strict = AnalysisConfig::default().with_strictness(StrictnessLevel::Strict);

        let a = analyzer().analyze(text, &context(), &lenient).await.unwrap();
        let b = analyzer().analyze(text, &context(), &strict).await.unwrap();
        assert!(b.grammar_score <= a.grammar_score);
        assert!(b.grammar_score < a.grammar_score);
    }

    #[tokio::test]
    async fn test_empty_text() {
        let result = analyzer()
            .analyze("   ", &context(), &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(result.grammar_score, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].description, messages::NO_TEXT);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig {
            language: String::new(),
            ..Default::default()
        };
        let err = analyzer()
            .analyze("Hello.", &context(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_critique_errors_are_merged() {
        let llm = MockLlm::new(
            r#"{"errors":[{"description":"Past tense of go is went","severity":"high",
                "original":"goed","suggestion":"went","confidence":0.8}],
                "fluencyScore":0.9,"vocabularyScore":0.4,"contextualFeedback":["Good effort"]}"#,
        );
        let analyzer = analyzer()
            .with_language_model(llm)
            .with_text_analysis(Arc::new(MockSyntax { fail: false }));

        let result = analyzer
            .analyze("I goed home.", &context(), &AnalysisConfig::default())
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.source, IssueSource::LanguageModel);
        assert_eq!(issue.span, Some(TextSpan::new(2, 6)));
        assert_eq!(issue.replacement.as_deref(), Some("went"));
        assert!((result.fluency_estimate - 0.9).abs() < 1e-6);
        assert!((result.vocabulary_estimate - 0.4).abs() < 1e-6);
        assert!((result.confidence - 0.9).abs() < 1e-6);
        assert!(result.feedback.contains(&"Good effort".to_string()));
        assert!(result.structure.is_some());
    }

    #[tokio::test]
    async fn test_overlapping_critique_error_is_dropped() {
        let llm = MockLlm::new(
            r#"{"errors":[{"description":"Use doesn't","severity":"high","original":"don't"}],
                "fluencyScore":0.8,"vocabularyScore":0.8}"#,
        );
        let result = analyzer()
            .with_language_model(llm)
            .analyze("He don't like it.", &context(), &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].source, IssueSource::Rule);
    }

    #[tokio::test]
    async fn test_degrades_when_services_fail() {
        let analyzer = analyzer()
            .with_language_model(Arc::new(FailingLlm))
            .with_text_analysis(Arc::new(MockSyntax { fail: true }));

        let result = analyzer
            .analyze("He don't like it.", &context(), &AnalysisConfig::default())
            .await
            .unwrap();

        assert!((result.confidence - 0.5).abs() < 1e-6);
        assert!(result.confidence > 0.0);
        assert!((result.fluency_estimate - 0.7).abs() < 1e-6);
        assert!((result.vocabulary_estimate - 0.7).abs() < 1e-6);
        assert_eq!(result.degraded_services, vec!["text_analysis", "language_model"]);
        assert!(result.structure.is_none());
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_malformed_critique_falls_back() {
        let llm = MockLlm::new("Looks fine to me!");
        let result = analyzer()
            .with_language_model(llm)
            .analyze("She has a cat.", &context(), &AnalysisConfig::default())
            .await
            .unwrap();
        assert!((result.fluency_estimate - 0.7).abs() < 1e-6);
        assert!(result.confidence < 0.7);
        assert_eq!(result.grammar_score, 1.0);
    }

    #[tokio::test]
    async fn test_contextual_analysis_disabled_skips_services() {
        let llm = MockLlm::new("{}");
        let analyzer = analyzer().with_language_model(llm.clone());
        let config = AnalysisConfig::default().with_contextual_analysis(false);

        let result = analyzer.analyze("She has a cat.", &context(), &config).await.unwrap();
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_issue_ceiling_by_strictness() {
        let text = "He don't know. She don't care. It don't work. He have one. \
                    She have two. They was here. We is there. I is ok.";
        let lenient = AnalysisConfig::default().with_strictness(StrictnessLevel::Lenient);
        let strict = AnalysisConfig::default().with_strictness(StrictnessLevel::Strict);

        let a = analyzer().analyze(text, &context(), &lenient).await.unwrap();
        let b = analyzer().analyze(text, &context(), &strict).await.unwrap();

        assert_eq!(a.issues.len(), 5);
        assert_eq!(a.suppressed_issues, 3);
        assert_eq!(b.issues.len(), 8);
        assert_eq!(b.suppressed_issues, 0);
        // Suppressed issues still count toward the score
        assert!(a.grammar_score < 0.2);
        assert_eq!(b.grammar_score, 0.0);
    }

    #[tokio::test]
    async fn test_structure_summary() {
        let result = analyzer()
            .with_text_analysis(Arc::new(MockSyntax { fail: false }))
            .analyze("He don't like it and .", &context(), &AnalysisConfig::default())
            .await
            .unwrap();
        let structure = result.structure.unwrap();
        assert_eq!(structure.token_count, 5);
        assert_eq!(structure.verb_count, 2);
        assert_eq!(structure.noun_count, 2);
        assert_eq!(structure.clause_markers, 1);
    }
}
