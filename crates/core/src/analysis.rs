//! Per-call analysis options and detected issue types

use serde::{Deserialize, Serialize};

use crate::{ConversationContext, Error, ProficiencyLevel, Result};

/// How hard the grammar analyzer grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    Lenient,
    #[default]
    Moderate,
    Strict,
}

/// Options passed by value with every analyzer call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub strictness: StrictnessLevel,
    /// Target tier; falls back to the learner's profile level when unset
    #[serde(default)]
    pub target_level: Option<ProficiencyLevel>,
    /// Run the remote language-model and syntax passes
    #[serde(default = "default_true")]
    pub enable_contextual_analysis: bool,
    /// Rule categories (grammar) or topical terms (vocabulary) to focus on
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Offer synonyms for variety
    #[serde(default = "default_true")]
    pub include_synonyms: bool,
    /// Language code forwarded to remote services
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strictness: StrictnessLevel::Moderate,
            target_level: None,
            enable_contextual_analysis: true,
            focus_areas: Vec::new(),
            include_synonyms: true,
            language: default_language(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_strictness(mut self, strictness: StrictnessLevel) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_target_level(mut self, level: ProficiencyLevel) -> Self {
        self.target_level = Some(level);
        self
    }

    pub fn with_contextual_analysis(mut self, enabled: bool) -> Self {
        self.enable_contextual_analysis = enabled;
        self
    }

    pub fn with_focus_area(mut self, area: impl Into<String>) -> Self {
        self.focus_areas.push(area.into());
        self
    }

    pub fn with_synonyms(mut self, enabled: bool) -> Self {
        self.include_synonyms = enabled;
        self
    }

    /// Target tier for this call
    pub fn effective_target(&self, context: &ConversationContext) -> ProficiencyLevel {
        self.target_level.unwrap_or(context.learner.level)
    }

    /// Reject option combinations that indicate caller misuse
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(Error::InvalidConfig("language code must not be empty".into()));
        }
        if let Some(area) = self.focus_areas.iter().find(|a| a.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "focus area entries must not be blank (got {:?})",
                area
            )));
        }
        Ok(())
    }
}

/// Ordinal issue severity; drives both penalty and ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Lenient parse used for model output; unknown labels map to medium
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "critical" | "major" | "error" => Severity::High,
            "low" | "minor" | "info" | "style" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

/// What kind of feedback item this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Grammar,
    Vocabulary,
    PronunciationGuide,
    Suggestion,
    Encouragement,
}

/// Which signal produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    Rule,
    LanguageModel,
    Heuristic,
}

/// Character offsets into the original utterance (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Convert a byte range from a regex match into character offsets
    pub fn from_byte_range(text: &str, start: usize, end: usize) -> Self {
        let to_chars = |byte: usize| text.get(..byte).map(|s| s.chars().count()).unwrap_or(0);
        Self::new(to_chars(start), to_chars(end))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A grammar/vocabulary error, guide or suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIssue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextSpan>,
    /// Suggested replacement or explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    /// Ranking confidence (0.0 - 1.0)
    pub confidence: f32,
    pub source: IssueSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl DetectedIssue {
    pub fn new(kind: IssueKind, description: impl Into<String>, source: IssueSource) -> Self {
        Self {
            kind,
            severity: None,
            description: description.into(),
            span: None,
            replacement: None,
            confidence: 0.5,
            source,
            rule_id: None,
        }
    }

    /// Grammar error found by a local rule
    pub fn grammar(rule_id: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            rule_id: Some(rule_id.into()),
            ..Self::new(IssueKind::Grammar, description, IssueSource::Rule)
        }
    }

    /// Informational notice (e.g. empty input)
    pub fn notice(description: impl Into<String>) -> Self {
        Self::new(IssueKind::Suggestion, description, IssueSource::Heuristic).with_confidence(1.0)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    /// Set confidence, clamped to [0, 1]; NaN becomes 0
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_target_falls_back_to_profile() {
        let context = ConversationContext::new(ProficiencyLevel::Advanced);
        let config = AnalysisConfig::default();
        assert_eq!(config.effective_target(&context), ProficiencyLevel::Advanced);

        let config = config.with_target_level(ProficiencyLevel::Beginner);
        assert_eq!(config.effective_target(&context), ProficiencyLevel::Beginner);
    }

    #[test]
    fn test_validate_rejects_blank_language() {
        let mut config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        config.language = "  ".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_blank_focus_area() {
        let config = AnalysisConfig::default().with_focus_area("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::parse_lenient("Critical"), Severity::High);
        assert_eq!(Severity::parse_lenient("whatever"), Severity::Medium);
    }

    #[test]
    fn test_span_from_byte_range_counts_chars() {
        let text = "café is nice";
        // "is" starts at byte 6 (é is two bytes) but char 5
        let span = TextSpan::from_byte_range(text, 6, 8);
        assert_eq!(span, TextSpan::new(5, 7));
    }

    #[test]
    fn test_issue_confidence_is_clamped() {
        let issue = DetectedIssue::notice("x").with_confidence(f32::NAN);
        assert_eq!(issue.confidence, 0.0);
        let issue = DetectedIssue::notice("x").with_confidence(1.7);
        assert_eq!(issue.confidence, 1.0);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"strictness":"strict","target_level":"beginner"}"#).unwrap();
        assert_eq!(config.strictness, StrictnessLevel::Strict);
        assert_eq!(config.target_level, Some(ProficiencyLevel::Beginner));
        assert!(config.enable_contextual_analysis);
        assert_eq!(config.language, "en");
    }
}
