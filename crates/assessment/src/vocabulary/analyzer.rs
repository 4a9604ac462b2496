//! Vocabulary analyzer
//!
//! Score = tier match + lexical diversity + topical appropriateness, each
//! weighted by [`VocabularyScoring`]. Tier match rewards being close to the
//! learner's target tier, not maximal complexity.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutor_config::constants::messages;
use tutor_config::VocabularyScoring;
use tutor_core::{
    AnalysisConfig, ConversationContext, DetectedIssue, Entity, IssueKind, IssueSource, KeyPhrase,
    LanguageModel, ProficiencyLevel, TextAnalysisService,
};

use super::lexicon::Lexicon;
use crate::critique::{self, VocabularyCritique};
use crate::error::AssessmentError;
use crate::metrics;
use crate::scoring::{clamp_unit, weighted_mean, AnalysisResult, Confidence, Remote};
use crate::tokenize;

const ANALYZER: &str = "vocabulary";
const SERVICE_TEXT: &str = "text_analysis";
const SERVICE_LLM: &str = "language_model";

const MIN_SHARED_PREFIX: usize = 4;
const DEFAULT_CONTEXTUAL_CONFIDENCE: f32 = 0.5;

/// Direction of a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Simpler,
    Advanced,
    Synonym,
    Contextual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularySuggestion {
    pub word: String,
    pub kind: SuggestionKind,
    pub alternatives: Vec<String>,
    pub explanation: String,
    pub confidence: f32,
}

impl VocabularySuggestion {
    pub fn to_issue(&self) -> DetectedIssue {
        let source = match self.kind {
            SuggestionKind::Contextual => IssueSource::LanguageModel,
            _ => IssueSource::Heuristic,
        };
        let mut issue = DetectedIssue::new(IssueKind::Vocabulary, self.explanation.clone(), source)
            .with_confidence(self.confidence);
        if let Some(first) = self.alternatives.first() {
            issue = issue.with_replacement(first.clone());
        }
        issue
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularyResult {
    pub vocabulary_score: f32,
    /// Tier nearest the mean tier of the content words
    pub complexity_level: ProficiencyLevel,
    pub tier_score: f32,
    pub diversity_score: f32,
    pub appropriateness_score: f32,
    /// Model estimate, or the fallback partial score
    pub contextual_score: f32,
    pub confidence: f32,
    pub suggestions: Vec<VocabularySuggestion>,
    pub alternatives: BTreeMap<String, Vec<String>>,
    pub key_phrases: Vec<String>,
    pub feedback: Vec<String>,
    pub word_count: usize,
    pub unique_word_count: usize,
    pub degraded_services: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl VocabularyResult {
    fn no_text() -> Self {
        Self {
            vocabulary_score: 0.0,
            complexity_level: ProficiencyLevel::Beginner,
            tier_score: 0.0,
            diversity_score: 0.0,
            appropriateness_score: 0.0,
            contextual_score: 0.0,
            confidence: 0.0,
            suggestions: Vec::new(),
            alternatives: BTreeMap::new(),
            key_phrases: Vec::new(),
            feedback: vec![messages::NO_TEXT.to_string()],
            word_count: 0,
            unique_word_count: 0,
            degraded_services: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

impl AnalysisResult for VocabularyResult {
    fn scores(&self) -> Vec<(&'static str, f32)> {
        vec![
            ("vocabulary", self.vocabulary_score),
            ("tier", self.tier_score),
            ("diversity", self.diversity_score),
            ("appropriateness", self.appropriateness_score),
            ("contextual", self.contextual_score),
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

struct TextSignals {
    entities: Vec<Entity>,
    key_phrases: Vec<KeyPhrase>,
}

pub struct VocabularyAnalyzer {
    lexicon: Arc<Lexicon>,
    scoring: VocabularyScoring,
    llm: Option<Arc<dyn LanguageModel>>,
    text_analysis: Option<Arc<dyn TextAnalysisService>>,
}

impl VocabularyAnalyzer {
    pub fn new(scoring: VocabularyScoring, lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            scoring,
            llm: None,
            text_analysis: None,
        }
    }

    pub fn with_language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_text_analysis(mut self, service: Arc<dyn TextAnalysisService>) -> Self {
        self.text_analysis = Some(service);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub async fn analyze(
        &self,
        text: &str,
        context: &ConversationContext,
        config: &AnalysisConfig,
    ) -> Result<VocabularyResult, AssessmentError> {
        config.validate()?;
        metrics::record_request(ANALYZER);
        let words = tokenize::words(text);
        if words.is_empty() {
            return Ok(VocabularyResult::no_text());
        }
        let started = Instant::now();
        let target = config.effective_target(context);

        let off_level: Vec<String> = unique_in_order(&words)
            .into_iter()
            .filter(|w| tokenize::is_content_word(w) && self.lexicon.level_of(w) != target)
            .map(str::to_string)
            .collect();

        let (signals, critique) = if config.enable_contextual_analysis {
            tokio::join!(
                self.fetch_text_signals(text, &config.language),
                self.fetch_critique(text, context, target, &off_level)
            )
        } else {
            (Remote::Skipped, Remote::Skipped)
        };

        let mut confidence =
            Confidence::new(self.scoring.baseline_confidence, self.scoring.min_confidence);
        let mut degraded_services = Vec::new();
        for (service, outcome) in [
            (SERVICE_TEXT, signals.outcome()),
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

        let (proper_nouns, key_phrases) = match signals.ok() {
            Some(signals) => (
                entity_words(&signals.entities),
                signals.key_phrases.into_iter().map(|k| k.text).collect(),
            ),
            None => (HashSet::new(), Vec::new()),
        };

        let gradable: Vec<&str> = words
            .iter()
            .map(String::as_str)
            .filter(|w| !proper_nouns.contains(*w))
            .collect();
        let content: Vec<&str> = gradable
            .iter()
            .copied()
            .filter(|w| tokenize::is_content_word(w))
            .collect();
        let tier_source = if content.is_empty() { &gradable } else { &content };

        let mean_weight = mean_tier_weight(&self.lexicon, tier_source)
            .unwrap_or_else(|| target.weight());
        let complexity_level = ProficiencyLevel::from_weight(mean_weight);
        let tier_score = clamp_unit(
            1.0 - (target.weight() - mean_weight).abs() / ProficiencyLevel::weight_range(),
        );
        let diversity_score = diversity(&words);
        let appropriateness_score = self.appropriateness(&content, context, config);

        let vocabulary_score = weighted_mean(&[
            (self.scoring.tier_weight, tier_score),
            (self.scoring.diversity_weight, diversity_score),
            (self.scoring.appropriateness_weight, appropriateness_score),
        ]);

        let mut candidates = self.local_suggestions(&gradable, target, config.include_synonyms);
        let mut feedback = Vec::new();
        let contextual_score = match critique.ok() {
            Some(critique) => {
                candidates.extend(critique.suggestions.into_iter().filter_map(|s| {
                    let word = s.word.trim().to_lowercase();
                    let alternatives: Vec<String> = s
                        .alternatives
                        .into_iter()
                        .filter(|a| !a.trim().is_empty())
                        .collect();
                    if word.is_empty() || alternatives.is_empty() {
                        return None;
                    }
                    Some(VocabularySuggestion {
                        explanation: s.explanation.unwrap_or_else(|| {
                            format!("Consider \"{}\" instead of \"{}\"", alternatives[0], word)
                        }),
                        word,
                        kind: SuggestionKind::Contextual,
                        alternatives,
                        confidence: clamp_unit(s.confidence.unwrap_or(DEFAULT_CONTEXTUAL_CONFIDENCE)),
                    })
                }));
                feedback.extend(critique.feedback.into_iter().filter(|f| !f.trim().is_empty()));
                clamp_unit(critique.vocabulary_score)
            },
            None => self.scoring.fallback_score,
        };

        let suggestions = rank_suggestions(candidates, self.scoring.max_suggestions);
        let mut alternatives: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for suggestion in &suggestions {
            let entry = alternatives.entry(suggestion.word.clone()).or_default();
            for alt in &suggestion.alternatives {
                if !entry.contains(alt) {
                    entry.push(alt.clone());
                }
            }
        }

        if tier_score >= 0.8 {
            feedback.insert(0, format!("Your word choice suits the {} level.", target));
        } else if mean_weight > target.weight() {
            feedback.insert(0, "Some words are above your target level; simpler words may be clearer.".to_string());
        } else {
            feedback.insert(0, "Try stretching your vocabulary with a few richer words.".to_string());
        }
        if words.len() >= 10 && diversity_score < 0.8 {
            feedback.push("Try to vary your words instead of repeating them.".to_string());
        }

        let unique_word_count = words.iter().collect::<HashSet<_>>().len();
        tracing::debug!(
            score = vocabulary_score,
            level = %complexity_level,
            suggestions = suggestions.len(),
            "Vocabulary analysis complete"
        );
        metrics::record_latency(ANALYZER, started.elapsed());

        Ok(VocabularyResult {
            vocabulary_score,
            complexity_level,
            tier_score,
            diversity_score,
            appropriateness_score,
            contextual_score,
            confidence: confidence.value(),
            suggestions,
            alternatives,
            key_phrases,
            feedback,
            word_count: words.len(),
            unique_word_count,
            degraded_services,
            timestamp: Utc::now(),
        })
    }

    /// Fraction of content words tied to the topic or focus areas
    fn appropriateness(
        &self,
        content: &[&str],
        context: &ConversationContext,
        config: &AnalysisConfig,
    ) -> f32 {
        let mut targets: Vec<String> = Vec::new();
        if let Some(topic) = &context.topic {
            targets.extend(self.lexicon.topic_terms(topic).iter().cloned());
            targets.extend(tokenize::words(topic));
        }
        for area in &config.focus_areas {
            targets.extend(tokenize::words(area));
        }
        if targets.is_empty() || content.is_empty() {
            return self.scoring.neutral_appropriateness;
        }
        let matching = content
            .iter()
            .filter(|word| targets.iter().any(|t| related(word, t)))
            .count();
        clamp_unit(matching as f32 / content.len() as f32)
    }

    fn local_suggestions(
        &self,
        words: &[&str],
        target: ProficiencyLevel,
        include_synonyms: bool,
    ) -> Vec<VocabularySuggestion> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in words {
            *counts.entry(*word).or_default() += 1;
        }

        let mut suggestions = Vec::new();
        for word in unique_in_order(words) {
            let Some(entry) = self.lexicon.entry(word) else {
                continue;
            };
            let gap = (entry.level.weight() - target.weight()).abs();

            if entry.level > target && !entry.simpler.is_empty() {
                suggestions.push(VocabularySuggestion {
                    word: word.to_string(),
                    kind: SuggestionKind::Simpler,
                    alternatives: entry.simpler.clone(),
                    explanation: format!(
                        "\"{}\" is {} vocabulary; \"{}\" is simpler",
                        word, entry.level, entry.simpler[0]
                    ),
                    confidence: (0.6 + 0.1 * gap).min(0.9),
                });
            }
            if target.wants_advanced_vocabulary()
                && entry.level <= target
                && !entry.advanced.is_empty()
            {
                suggestions.push(VocabularySuggestion {
                    word: word.to_string(),
                    kind: SuggestionKind::Advanced,
                    alternatives: entry.advanced.clone(),
                    explanation: format!(
                        "Try \"{}\" instead of \"{}\" for a more {} tone",
                        entry.advanced[0], word, target
                    ),
                    confidence: (0.55 + 0.05 * gap).min(0.8),
                });
            }
            if include_synonyms && !entry.synonyms.is_empty() {
                let repeated = counts.get(word).copied().unwrap_or(0) > 1;
                suggestions.push(VocabularySuggestion {
                    word: word.to_string(),
                    kind: SuggestionKind::Synonym,
                    alternatives: entry.synonyms.clone(),
                    explanation: format!("For variety, \"{}\" could be \"{}\"", word, entry.synonyms[0]),
                    confidence: if repeated { 0.6 } else { 0.5 },
                });
            }
        }
        suggestions
    }

    async fn fetch_text_signals(&self, text: &str, language: &str) -> Remote<TextSignals> {
        let Some(service) = &self.text_analysis else {
            return Remote::Skipped;
        };
        let (entities, key_phrases) = tokio::join!(
            service.detect_entities(text, language),
            service.detect_key_phrases(text, language)
        );
        match (entities, key_phrases) {
            (Ok(entities), Ok(key_phrases)) => Remote::Ok(TextSignals {
                entities,
                key_phrases,
            }),
            (Err(e), _) | (_, Err(e)) => Remote::failed(ANALYZER, SERVICE_TEXT, e),
        }
    }

    async fn fetch_critique(
        &self,
        text: &str,
        context: &ConversationContext,
        target: ProficiencyLevel,
        off_level: &[String],
    ) -> Remote<VocabularyCritique> {
        let Some(llm) = &self.llm else {
            return Remote::Skipped;
        };
        let request = critique::vocabulary_request(text, context, target, off_level);
        match critique::request_critique::<VocabularyCritique>(llm.as_ref(), request).await {
            Ok(critique) => Remote::Ok(critique),
            Err(e) => Remote::failed(ANALYZER, SERVICE_LLM, e),
        }
    }
}

fn unique_in_order<'a, S: AsRef<str>>(words: &'a [S]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    words
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| seen.insert(*w))
        .collect()
}

/// Lowercased words of named entities, excluded from tiering
fn entity_words(entities: &[Entity]) -> HashSet<String> {
    entities
        .iter()
        .flat_map(|e| tokenize::words(&e.text))
        .collect()
}

fn mean_tier_weight(lexicon: &Lexicon, words: &[&str]) -> Option<f32> {
    if words.is_empty() {
        return None;
    }
    let total: f32 = words.iter().map(|w| lexicon.level_of(w).weight()).sum();
    Some(total / words.len() as f32)
}

/// Herdan's C: log(types) / log(tokens)
///
/// Raw type-token ratio falls as utterances grow; the log ratio keeps short
/// and long utterances comparable.
fn diversity(words: &[String]) -> f32 {
    let total = words.len();
    if total <= 1 {
        return if total == 1 { 1.0 } else { 0.0 };
    }
    let unique = words.iter().collect::<HashSet<_>>().len();
    clamp_unit((unique as f32).ln() / (total as f32).ln())
}

/// Exact match or a shared prefix of at least four characters
fn related(word: &str, target: &str) -> bool {
    if word == target {
        return true;
    }
    let shared = word
        .chars()
        .zip(target.chars())
        .take_while(|(a, b)| a == b)
        .count();
    shared >= MIN_SHARED_PREFIX
}

/// Dedup by (word, kind) keeping the most confident, then sort and truncate
fn rank_suggestions(candidates: Vec<VocabularySuggestion>, max: usize) -> Vec<VocabularySuggestion> {
    let mut best: HashMap<(String, SuggestionKind), VocabularySuggestion> = HashMap::new();
    for suggestion in candidates {
        let key = (suggestion.word.clone(), suggestion.kind);
        match best.get(&key) {
            Some(existing) if existing.confidence >= suggestion.confidence => {},
            _ => {
                best.insert(key, suggestion);
            },
        }
    }
    let mut ranked: Vec<VocabularySuggestion> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.word.cmp(&b.word))
    });
    ranked.truncate(max);
    ranked
}
