//! End-to-end behavior of the analyzers across healthy, failing and absent
//! remote services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tutor_assessment::{
    AnalysisResult, FluencyAnalyzer, GrammarAnalyzer, Lexicon, SuggestionKind, TurnAssessor,
    VocabularyAnalyzer,
};
use tutor_config::{FluencyScoring, GrammarScoring, ScoringSettings, VocabularyScoring};
use tutor_core::{
    AnalysisConfig, AudioClip, ConversationContext, Entity, Error, GenerateRequest,
    GenerateResponse, IssueKind, KeyPhrase, LanguageModel, ProficiencyLevel, Result, Severity,
    SpeechToText, StrictnessLevel, SyntaxToken, TextAnalysisService, TranscriptResult, Utterance,
};

const NO_TEXT: &str = "No text provided for analysis";

struct MockLlm;

#[async_trait]
impl LanguageModel for MockLlm {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let system = &request.messages[0].content;
        let reply = if system.contains("vocabulary coach") {
            r#"{"vocabularyScore":0.6,"suggestions":[],"feedback":["Nice words"]}"#
        } else if system.contains("speaking coach") {
            r#"{"fluencyScore":0.8,"feedback":["Smooth"]}"#
        } else {
            r#"```json
{"errors":[],"fluencyScore":0.8,"vocabularyScore":0.6,"contextualFeedback":["Clear"]}
```"#
        };
        Ok(GenerateResponse::text(reply))
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
        Err(Error::Llm("503 Service Unavailable".into()))
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "failing-llm"
    }
}

struct GarbageLlm;

#[async_trait]
impl LanguageModel for GarbageLlm {
    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
        Ok(GenerateResponse::text("{\"fluencyScore\": NaN, \"errors\": \"none\""))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "garbage-llm"
    }
}

struct FailingTextAnalysis;

#[async_trait]
impl TextAnalysisService for FailingTextAnalysis {
    async fn analyze_syntax(&self, _text: &str, _language: &str) -> Result<Vec<SyntaxToken>> {
        Err(Error::Timeout(5_000))
    }

    async fn detect_entities(&self, _text: &str, _language: &str) -> Result<Vec<Entity>> {
        Err(Error::Timeout(5_000))
    }

    async fn detect_key_phrases(&self, _text: &str, _language: &str) -> Result<Vec<KeyPhrase>> {
        Err(Error::Timeout(5_000))
    }

    fn service_name(&self) -> &str {
        "failing-text-analysis"
    }
}

struct FailingStt;

#[async_trait]
impl SpeechToText for FailingStt {
    async fn transcribe(&self, _audio: &AudioClip, _language: &str) -> Result<TranscriptResult> {
        Err(Error::Stt("connection reset".into()))
    }

    fn model_name(&self) -> &str {
        "failing-stt"
    }
}

fn beginner() -> ConversationContext {
    ConversationContext::new(ProficiencyLevel::Beginner).with_topic("food")
}

fn silence(secs: f32) -> AudioClip {
    AudioClip::silence(Duration::from_secs_f32(secs), 16000)
}

fn all_unit(scores: &[(&str, f32)], confidence: f32) -> bool {
    scores
        .iter()
        .map(|(_, s)| *s)
        .chain(std::iter::once(confidence))
        .all(|v| v.is_finite() && (0.0..=1.0).contains(&v))
}

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "?!",
    "He don't like it.",
    "The extraordinary establishment was magnificent.",
    "um um um I I I went went to to the the the shop",
    "I don't know nothing about nobody and they was never here so it don't matter at all \
     because we is going home now and I is tired and he have a apple and an banana",
    "Ünïcödé wörds ünd émojis 🎉 are fine too.",
    "a",
];

#[tokio::test]
async fn test_scores_stay_in_unit_range_for_every_input() {
    let configs = [
        AnalysisConfig::default().with_strictness(StrictnessLevel::Strict),
        AnalysisConfig::default()
            .with_strictness(StrictnessLevel::Lenient)
            .with_target_level(ProficiencyLevel::Proficient),
    ];
    let grammar = GrammarAnalyzer::new(GrammarScoring::default())
        .with_language_model(Arc::new(GarbageLlm))
        .with_text_analysis(Arc::new(FailingTextAnalysis));
    let vocabulary =
        VocabularyAnalyzer::new(VocabularyScoring::default(), Arc::new(Lexicon::builtin()))
            .with_language_model(Arc::new(FailingLlm));
    let fluency = FluencyAnalyzer::new(FluencyScoring::default())
        .with_language_model(Arc::new(MockLlm))
        .with_speech_to_text(Arc::new(FailingStt));
    let audio = silence(0.3);

    for text in SAMPLES {
        for config in &configs {
            let g = grammar.analyze(text, &beginner(), config).await.unwrap();
            assert!(all_unit(&g.scores(), g.confidence()), "grammar: {:?}", text);
            assert!(g.issues.iter().all(|i| (0.0..=1.0).contains(&i.confidence)));

            let v = vocabulary.analyze(text, &beginner(), config).await.unwrap();
            assert!(all_unit(&v.scores(), v.confidence()), "vocabulary: {:?}", text);

            for clip in [None, Some(&audio)] {
                let f = fluency
                    .analyze_fluency(clip, text, &beginner(), config)
                    .await
                    .unwrap();
                assert!(all_unit(&f.scores(), f.confidence()), "fluency: {:?}", text);
            }
        }
    }
}

#[tokio::test]
async fn test_empty_text_yields_zero_with_marker_everywhere() {
    let config = AnalysisConfig::default();
    let grammar = GrammarAnalyzer::new(GrammarScoring::default())
        .with_language_model(Arc::new(MockLlm))
        .analyze("", &beginner(), &config)
        .await
        .unwrap();
    assert_eq!((grammar.grammar_score, grammar.confidence), (0.0, 0.0));
    assert!(grammar.feedback.iter().any(|f| f == NO_TEXT));

    let vocabulary =
        VocabularyAnalyzer::new(VocabularyScoring::default(), Arc::new(Lexicon::builtin()))
            .analyze("", &beginner(), &config)
            .await
            .unwrap();
    assert_eq!((vocabulary.vocabulary_score, vocabulary.confidence), (0.0, 0.0));
    assert!(vocabulary.feedback.iter().any(|f| f == NO_TEXT));

    let fluency = FluencyAnalyzer::new(FluencyScoring::default())
        .analyze_fluency(None, "", &beginner(), &config)
        .await
        .unwrap();
    assert_eq!((fluency.fluency_score, fluency.confidence), (0.0, 0.0));
    assert!(fluency.feedback.iter().any(|f| f == NO_TEXT));
}

#[tokio::test]
async fn test_punctuation_only_counts_as_no_text_everywhere() {
    let config = AnalysisConfig::default();
    let grammar = GrammarAnalyzer::new(GrammarScoring::default());
    let vocabulary =
        VocabularyAnalyzer::new(VocabularyScoring::default(), Arc::new(Lexicon::builtin()));
    let fluency = FluencyAnalyzer::new(FluencyScoring::default());

    for text in ["?!", "...", "--"] {
        let g = grammar.analyze(text, &beginner(), &config).await.unwrap();
        assert_eq!((g.grammar_score, g.confidence), (0.0, 0.0), "{:?}", text);
        assert!(g.feedback.iter().any(|f| f == NO_TEXT));

        let v = vocabulary.analyze(text, &beginner(), &config).await.unwrap();
        assert_eq!((v.vocabulary_score, v.confidence), (0.0, 0.0), "{:?}", text);
        assert!(v.feedback.iter().any(|f| f == NO_TEXT));

        let f = fluency
            .analyze_fluency(None, text, &beginner(), &config)
            .await
            .unwrap();
        assert_eq!((f.fluency_score, f.confidence), (0.0, 0.0), "{:?}", text);
        assert!(f.feedback.iter().any(|line| line == NO_TEXT));
    }
}

#[tokio::test]
async fn test_third_person_dont_is_high_severity_agreement_error() {
    let result = GrammarAnalyzer::new(GrammarScoring::default())
        .analyze("He don't like it.", &beginner(), &AnalysisConfig::default())
        .await
        .unwrap();
    assert!(result.issues.iter().any(|i| i.kind == IssueKind::Grammar
        && i.severity == Some(Severity::High)
        && i.description.to_lowercase().contains("agreement")));
}

#[tokio::test]
async fn test_strict_never_scores_above_lenient() {
    let analyzer = GrammarAnalyzer::new(GrammarScoring::default());
    for text in SAMPLES {
        let lenient = analyzer
            .analyze(
                text,
                &beginner(),
                &AnalysisConfig::default().with_strictness(StrictnessLevel::Lenient),
            )
            .await
            .unwrap();
        let strict = analyzer
            .analyze(
                text,
                &beginner(),
                &AnalysisConfig::default().with_strictness(StrictnessLevel::Strict),
            )
            .await
            .unwrap();
        assert!(strict.grammar_score <= lenient.grammar_score, "{:?}", text);
    }
}

#[tokio::test]
async fn test_beginner_gets_simpler_alternatives_bounded_and_sorted() {
    let analyzer =
        VocabularyAnalyzer::new(VocabularyScoring::default(), Arc::new(Lexicon::builtin()));
    let config = AnalysisConfig::default().with_target_level(ProficiencyLevel::Beginner);
    let result = analyzer
        .analyze(
            "The extraordinary establishment was magnificent.",
            &beginner(),
            &config,
        )
        .await
        .unwrap();

    assert!(result
        .suggestions
        .iter()
        .any(|s| s.kind == SuggestionKind::Simpler));
    assert!(result.suggestions.len() <= 5);
    assert!(result
        .suggestions
        .windows(2)
        .all(|pair| pair[0].confidence >= pair[1].confidence));
}

#[tokio::test]
async fn test_pace_feedback_for_fast_and_slow_speech() {
    let analyzer = FluencyAnalyzer::new(FluencyScoring::default());
    let text = "We went to the beach and swam in the sea.";
    let config = AnalysisConfig::default();

    let fast = analyzer
        .analyze_fluency(Some(&silence(2.4)), text, &beginner(), &config)
        .await
        .unwrap();
    assert!(fast.words_per_minute >= 249.0);
    assert!(fast.pace_score < 0.7);
    assert!(fast.feedback.iter().any(|f| f.contains("too quickly")));

    let slow = analyzer
        .analyze_fluency(Some(&silence(12.0)), text, &beginner(), &config)
        .await
        .unwrap();
    assert!(slow.words_per_minute < 60.0);
    assert!(slow.feedback.iter().any(|f| f.contains("too slowly")));
}

#[tokio::test]
async fn test_rejected_critique_degrades_instead_of_failing() {
    let analyzer =
        FluencyAnalyzer::new(FluencyScoring::default()).with_language_model(Arc::new(FailingLlm));
    let result = analyzer
        .analyze_fluency(
            None,
            "I like to cook pasta with my family.",
            &beginner(),
            &AnalysisConfig::default(),
        )
        .await
        .unwrap();
    assert!(result.fluency_score > 0.0);
    assert!(result.confidence < 0.7);
    assert!(result.is_degraded());
}

#[tokio::test]
async fn test_repeated_calls_give_identical_scores() {
    let assessor = TurnAssessor::from_services(
        &ScoringSettings::default(),
        Arc::new(Lexicon::builtin()),
        Some(Arc::new(MockLlm)),
        Some(Arc::new(FailingStt)),
        Some(Arc::new(FailingTextAnalysis)),
    );
    let utterance = Utterance::new("He don't like the delicious food at this restaurant.")
        .with_audio(silence(3.0))
        .with_context(beginner());
    let config = AnalysisConfig::default();

    let a = assessor.assess(&utterance, &config).await.unwrap();
    let b = assessor.assess(&utterance, &config).await.unwrap();

    assert_eq!(a.overall_score, b.overall_score);
    assert_eq!(a.confidence, b.confidence);
    assert_eq!(a.grammar.scores(), b.grammar.scores());
    assert_eq!(a.vocabulary.scores(), b.vocabulary.scores());
    assert_eq!(a.fluency.scores(), b.fluency.scores());
    let severities = |t: &tutor_assessment::TurnAssessment| {
        t.grammar.issues.iter().map(|i| i.severity).collect::<Vec<_>>()
    };
    assert_eq!(severities(&a), severities(&b));
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_no_services_reachable_still_returns_complete_result() {
    let assessor = TurnAssessor::from_services(
        &ScoringSettings::default(),
        Arc::new(Lexicon::builtin()),
        Some(Arc::new(FailingLlm)),
        Some(Arc::new(FailingStt)),
        Some(Arc::new(FailingTextAnalysis)),
    );
    let utterance = Utterance::new("They was cooking dinner for the family.")
        .with_audio(silence(3.0))
        .with_context(beginner());

    let assessment = assessor
        .assess(&utterance, &AnalysisConfig::default())
        .await
        .unwrap();

    assert!(assessment.overall_score > 0.0);
    assert!(assessment.grammar.confidence < 0.7);
    assert!(assessment.vocabulary.confidence < 0.7);
    assert!(assessment.fluency.confidence < 0.7);
    assert_eq!(
        assessment.degraded_services(),
        vec!["language_model", "speech_to_text", "text_analysis"]
    );
}

#[tokio::test]
async fn test_healthy_services_raise_confidence() {
    let healthy = GrammarAnalyzer::new(GrammarScoring::default())
        .with_language_model(Arc::new(MockLlm))
        .analyze("She cooks dinner.", &beginner(), &AnalysisConfig::default())
        .await
        .unwrap();
    let failing = GrammarAnalyzer::new(GrammarScoring::default())
        .with_language_model(Arc::new(FailingLlm))
        .analyze("She cooks dinner.", &beginner(), &AnalysisConfig::default())
        .await
        .unwrap();
    assert!(healthy.confidence > 0.7);
    assert!(failing.confidence < 0.7);
    assert_eq!(healthy.grammar_score, failing.grammar_score);
    assert!(healthy.feedback.contains(&"Clear".to_string()));
}
