//! Tunable scoring weights
//!
//! Every numeric split used by the analyzers is exposed here so it can be
//! tuned from configuration. Defaults reproduce the documented behaviour.

use serde::{Deserialize, Serialize};
use tutor_core::{ProficiencyLevel, Severity, StrictnessLevel};

use crate::constants::fallback;
use crate::ConfigError;

/// All analyzer weights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub grammar: GrammarScoring,
    #[serde(default)]
    pub vocabulary: VocabularyScoring,
    #[serde(default)]
    pub fluency: FluencyScoring,
    #[serde(default)]
    pub composite: CompositeScoring,
}

impl ScoringSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grammar.validate()?;
        self.vocabulary.validate()?;
        self.fluency.validate()?;
        self.composite.validate()?;
        Ok(())
    }
}

fn check_unit(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("Must be between 0.0 and 1.0, got {}", value),
        ));
    }
    Ok(())
}

fn check_positive_sum(field: &str, values: &[f32]) -> Result<(), ConfigError> {
    if values.iter().sum::<f32>() <= 0.0 {
        return Err(ConfigError::invalid(field, "Weights must not all be zero"));
    }
    Ok(())
}

/// Grammar analyzer weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarScoring {
    pub penalty_high: f32,
    pub penalty_medium: f32,
    pub penalty_low: f32,
    pub lenient_multiplier: f32,
    pub moderate_multiplier: f32,
    pub strict_multiplier: f32,
    pub lenient_max_issues: usize,
    pub moderate_max_issues: usize,
    pub strict_max_issues: usize,
    pub baseline_confidence: f32,
    pub remote_success_bonus: f32,
    pub remote_failure_penalty: f32,
    /// Floor so a degraded result never reports zero confidence
    pub min_confidence: f32,
    /// Stand-in for the model's fluency/vocabulary estimates when unavailable
    pub fallback_score: f32,
    /// Sentences longer than this many words are flagged as run-ons
    pub run_on_max_words: usize,
}

impl Default for GrammarScoring {
    fn default() -> Self {
        Self {
            penalty_high: 0.15,
            penalty_medium: 0.08,
            penalty_low: 0.03,
            lenient_multiplier: 0.7,
            moderate_multiplier: 1.0,
            strict_multiplier: 1.3,
            lenient_max_issues: 5,
            moderate_max_issues: 8,
            strict_max_issues: 10,
            baseline_confidence: fallback::BASELINE_CONFIDENCE,
            remote_success_bonus: 0.1,
            remote_failure_penalty: 0.1,
            min_confidence: 0.3,
            fallback_score: fallback::PARTIAL_SCORE,
            run_on_max_words: 25,
        }
    }
}

impl GrammarScoring {
    pub fn penalty_for(&self, severity: Severity) -> f32 {
        match severity {
            Severity::High => self.penalty_high,
            Severity::Medium => self.penalty_medium,
            Severity::Low => self.penalty_low,
        }
    }

    pub fn strictness_multiplier(&self, strictness: StrictnessLevel) -> f32 {
        match strictness {
            StrictnessLevel::Lenient => self.lenient_multiplier,
            StrictnessLevel::Moderate => self.moderate_multiplier,
            StrictnessLevel::Strict => self.strict_multiplier,
        }
    }

    /// How many issues are kept in the list before the rest are suppressed
    pub fn max_issues(&self, strictness: StrictnessLevel) -> usize {
        match strictness {
            StrictnessLevel::Lenient => self.lenient_max_issues,
            StrictnessLevel::Moderate => self.moderate_max_issues,
            StrictnessLevel::Strict => self.strict_max_issues,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("scoring.grammar.penalty_high", self.penalty_high)?;
        check_unit("scoring.grammar.penalty_medium", self.penalty_medium)?;
        check_unit("scoring.grammar.penalty_low", self.penalty_low)?;
        check_unit("scoring.grammar.baseline_confidence", self.baseline_confidence)?;
        check_unit("scoring.grammar.min_confidence", self.min_confidence)?;
        check_unit("scoring.grammar.fallback_score", self.fallback_score)?;

        if !(self.penalty_high >= self.penalty_medium && self.penalty_medium >= self.penalty_low) {
            return Err(ConfigError::invalid(
                "scoring.grammar.penalty_*",
                "Penalties must not increase as severity decreases",
            ));
        }
        if !(self.lenient_multiplier <= self.moderate_multiplier
            && self.moderate_multiplier <= self.strict_multiplier)
        {
            return Err(ConfigError::invalid(
                "scoring.grammar.*_multiplier",
                "Strictness multipliers must be ordered lenient <= moderate <= strict",
            ));
        }
        if self.lenient_multiplier < 0.0 {
            return Err(ConfigError::invalid(
                "scoring.grammar.lenient_multiplier",
                "Must not be negative",
            ));
        }
        if self.lenient_max_issues == 0 || self.moderate_max_issues == 0 || self.strict_max_issues == 0
        {
            return Err(ConfigError::invalid(
                "scoring.grammar.*_max_issues",
                "Issue ceilings must be at least 1",
            ));
        }
        if self.run_on_max_words < 5 {
            return Err(ConfigError::invalid(
                "scoring.grammar.run_on_max_words",
                "Must be at least 5",
            ));
        }
        Ok(())
    }
}

/// Vocabulary analyzer weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyScoring {
    pub tier_weight: f32,
    pub diversity_weight: f32,
    pub appropriateness_weight: f32,
    pub max_suggestions: usize,
    /// Used when the model's vocabulary estimate is unavailable
    pub fallback_score: f32,
    /// Appropriateness when neither a topic nor focus areas are known
    pub neutral_appropriateness: f32,
    pub baseline_confidence: f32,
    pub remote_success_bonus: f32,
    pub remote_failure_penalty: f32,
    pub min_confidence: f32,
}

impl Default for VocabularyScoring {
    fn default() -> Self {
        Self {
            tier_weight: 0.4,
            diversity_weight: 0.3,
            appropriateness_weight: 0.3,
            max_suggestions: 5,
            fallback_score: fallback::PARTIAL_SCORE,
            neutral_appropriateness: 0.7,
            baseline_confidence: fallback::BASELINE_CONFIDENCE,
            remote_success_bonus: 0.1,
            remote_failure_penalty: 0.1,
            min_confidence: 0.3,
        }
    }
}

impl VocabularyScoring {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("scoring.vocabulary.tier_weight", self.tier_weight)?;
        check_unit("scoring.vocabulary.diversity_weight", self.diversity_weight)?;
        check_unit(
            "scoring.vocabulary.appropriateness_weight",
            self.appropriateness_weight,
        )?;
        check_positive_sum(
            "scoring.vocabulary",
            &[self.tier_weight, self.diversity_weight, self.appropriateness_weight],
        )?;
        check_unit("scoring.vocabulary.fallback_score", self.fallback_score)?;
        check_unit(
            "scoring.vocabulary.neutral_appropriateness",
            self.neutral_appropriateness,
        )?;
        check_unit("scoring.vocabulary.baseline_confidence", self.baseline_confidence)?;
        check_unit("scoring.vocabulary.min_confidence", self.min_confidence)?;
        if self.max_suggestions == 0 {
            return Err(ConfigError::invalid(
                "scoring.vocabulary.max_suggestions",
                "Must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Fluency analyzer weights and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluencyScoring {
    pub optimal_wpm_min: f32,
    pub optimal_wpm_max: f32,
    /// Clips shorter than this are unreliable
    pub min_audio_secs: f32,
    /// Speaking rates outside this band mean audio and text do not belong together
    pub mismatch_wpm_min: f32,
    pub mismatch_wpm_max: f32,
    pub low_confidence_threshold: f32,
    pub very_low_confidence_threshold: f32,
    pub pronunciation_weight: f32,
    pub rhythm_weight: f32,
    pub pace_weight: f32,
    pub transcription_weight: f32,
    /// Share of the final score taken by the model's holistic estimate
    pub holistic_weight: f32,
    pub beginner_leniency: f32,
    pub intermediate_leniency: f32,
    /// Extra pronunciation weight for beginners
    pub beginner_pronunciation_boost: f32,
    pub baseline_confidence: f32,
    pub text_only_penalty: f32,
    pub short_audio_penalty: f32,
    pub mismatch_penalty: f32,
    pub remote_success_bonus: f32,
    pub remote_failure_penalty: f32,
    pub min_confidence: f32,
    pub fallback_score: f32,
}

impl Default for FluencyScoring {
    fn default() -> Self {
        Self {
            optimal_wpm_min: 120.0,
            optimal_wpm_max: 180.0,
            min_audio_secs: 1.0,
            mismatch_wpm_min: 20.0,
            mismatch_wpm_max: 400.0,
            low_confidence_threshold: 0.7,
            very_low_confidence_threshold: 0.5,
            pronunciation_weight: 0.3,
            rhythm_weight: 0.25,
            pace_weight: 0.25,
            transcription_weight: 0.2,
            holistic_weight: 0.2,
            beginner_leniency: 0.3,
            intermediate_leniency: 0.15,
            beginner_pronunciation_boost: 0.1,
            baseline_confidence: fallback::BASELINE_CONFIDENCE,
            text_only_penalty: 0.2,
            short_audio_penalty: 0.3,
            mismatch_penalty: 0.2,
            remote_success_bonus: 0.1,
            remote_failure_penalty: 0.15,
            min_confidence: 0.1,
            fallback_score: fallback::PARTIAL_SCORE,
        }
    }
}

impl FluencyScoring {
    /// Fraction of the pronunciation shortfall forgiven for this tier
    pub fn pronunciation_leniency(&self, level: ProficiencyLevel) -> f32 {
        match level {
            ProficiencyLevel::Beginner => self.beginner_leniency,
            ProficiencyLevel::Intermediate => self.intermediate_leniency,
            ProficiencyLevel::Advanced | ProficiencyLevel::Proficient => 0.0,
        }
    }

    /// Pronunciation weight, shifted up for beginners
    pub fn pronunciation_weight_for(&self, level: ProficiencyLevel) -> f32 {
        match level {
            ProficiencyLevel::Beginner => {
                self.pronunciation_weight + self.beginner_pronunciation_boost
            },
            _ => self.pronunciation_weight,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.optimal_wpm_min <= 0.0 || self.optimal_wpm_min >= self.optimal_wpm_max {
            return Err(ConfigError::invalid(
                "scoring.fluency.optimal_wpm_*",
                format!(
                    "Optimal band must satisfy 0 < min < max, got {}..{}",
                    self.optimal_wpm_min, self.optimal_wpm_max
                ),
            ));
        }
        if !(self.mismatch_wpm_min < self.optimal_wpm_min
            && self.mismatch_wpm_max > self.optimal_wpm_max)
        {
            return Err(ConfigError::invalid(
                "scoring.fluency.mismatch_wpm_*",
                "Mismatch band must enclose the optimal band",
            ));
        }
        if self.min_audio_secs < 0.0 {
            return Err(ConfigError::invalid(
                "scoring.fluency.min_audio_secs",
                "Must not be negative",
            ));
        }
        check_unit(
            "scoring.fluency.low_confidence_threshold",
            self.low_confidence_threshold,
        )?;
        check_unit(
            "scoring.fluency.very_low_confidence_threshold",
            self.very_low_confidence_threshold,
        )?;
        if self.very_low_confidence_threshold > self.low_confidence_threshold {
            return Err(ConfigError::invalid(
                "scoring.fluency.very_low_confidence_threshold",
                "Must not exceed low_confidence_threshold",
            ));
        }
        for (field, value) in [
            ("pronunciation_weight", self.pronunciation_weight),
            ("rhythm_weight", self.rhythm_weight),
            ("pace_weight", self.pace_weight),
            ("transcription_weight", self.transcription_weight),
            ("holistic_weight", self.holistic_weight),
            ("beginner_leniency", self.beginner_leniency),
            ("intermediate_leniency", self.intermediate_leniency),
            ("beginner_pronunciation_boost", self.beginner_pronunciation_boost),
            ("baseline_confidence", self.baseline_confidence),
            ("min_confidence", self.min_confidence),
            ("fallback_score", self.fallback_score),
        ] {
            check_unit(&format!("scoring.fluency.{}", field), value)?;
        }
        check_positive_sum(
            "scoring.fluency",
            &[self.rhythm_weight, self.transcription_weight, self.holistic_weight],
        )?;
        Ok(())
    }
}

/// Per-dimension weights for the composite turn score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeScoring {
    pub grammar_weight: f32,
    pub vocabulary_weight: f32,
    pub fluency_weight: f32,
}

impl Default for CompositeScoring {
    fn default() -> Self {
        Self {
            grammar_weight: 0.35,
            vocabulary_weight: 0.30,
            fluency_weight: 0.35,
        }
    }
}

impl CompositeScoring {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("scoring.composite.grammar_weight", self.grammar_weight)?;
        check_unit("scoring.composite.vocabulary_weight", self.vocabulary_weight)?;
        check_unit("scoring.composite.fluency_weight", self.fluency_weight)?;
        check_positive_sum(
            "scoring.composite",
            &[self.grammar_weight, self.vocabulary_weight, self.fluency_weight],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ScoringSettings::default().validate().is_ok());
    }

    #[test]
    fn test_strictness_lookup() {
        let grammar = GrammarScoring::default();
        assert_eq!(grammar.max_issues(StrictnessLevel::Lenient), 5);
        assert_eq!(grammar.max_issues(StrictnessLevel::Strict), 10);
        assert!(
            grammar.strictness_multiplier(StrictnessLevel::Strict)
                > grammar.strictness_multiplier(StrictnessLevel::Lenient)
        );
        assert!(grammar.penalty_for(Severity::High) > grammar.penalty_for(Severity::Low));
    }

    #[test]
    fn test_inverted_wpm_band_rejected() {
        let mut scoring = ScoringSettings::default();
        scoring.fluency.optimal_wpm_min = 200.0;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_zero_vocabulary_weights_rejected() {
        let mut scoring = ScoringSettings::default();
        scoring.vocabulary.tier_weight = 0.0;
        scoring.vocabulary.diversity_weight = 0.0;
        scoring.vocabulary.appropriateness_weight = 0.0;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_unordered_multipliers_rejected() {
        let mut scoring = ScoringSettings::default();
        scoring.grammar.strict_multiplier = 0.5;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_beginner_pronunciation_adjustments() {
        let fluency = FluencyScoring::default();
        assert!(
            fluency.pronunciation_weight_for(ProficiencyLevel::Beginner)
                > fluency.pronunciation_weight_for(ProficiencyLevel::Advanced)
        );
        assert_eq!(fluency.pronunciation_leniency(ProficiencyLevel::Proficient), 0.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let scoring: ScoringSettings = toml::from_str(
            r#"
            [fluency]
            optimal_wpm_min = 110.0
            "#,
        )
        .unwrap();
        assert_eq!(scoring.fluency.optimal_wpm_min, 110.0);
        assert_eq!(scoring.fluency.optimal_wpm_max, 180.0);
        assert_eq!(scoring.grammar, GrammarScoring::default());
    }
}
