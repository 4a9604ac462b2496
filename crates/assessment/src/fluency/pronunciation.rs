//! Pronunciation from transcription confidence
//!
//! Low speech-to-text confidence is taken as a sign the learner was hard
//! to understand. Guides break the longest words of the utterance into
//! syllables for practice.

use serde::Serialize;
use tutor_config::FluencyScoring;
use tutor_core::{AudioClip, DetectedIssue, IssueKind, IssueSource, ProficiencyLevel, Severity};

use crate::scoring::clamp_unit;
use crate::tokenize;

const MAX_PRACTICE_WORDS: usize = 3;
const MIN_PRACTICE_SYLLABLES: usize = 3;

const QUITE_LOW: &str =
    "Transcription confidence was quite low; your pronunciation needs attention. Try speaking slowly and clearly.";
const SOMEWHAT_LOW: &str =
    "Some words were hard to recognise; practise the highlighted words syllable by syllable.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PronunciationAnalysis {
    /// 0.0 when there is no audio
    pub score: f32,
    pub transcription_confidence: Option<f32>,
    pub guides: Vec<DetectedIssue>,
    pub feedback: Vec<String>,
}

impl PronunciationAnalysis {
    fn no_audio() -> Self {
        Self {
            score: 0.0,
            transcription_confidence: None,
            guides: Vec::new(),
            feedback: Vec::new(),
        }
    }
}

pub(crate) fn analyze(
    scoring: &FluencyScoring,
    audio: Option<&AudioClip>,
    text: &str,
    transcript_confidence: Option<f32>,
    level: ProficiencyLevel,
) -> PronunciationAnalysis {
    if audio.map_or(true, AudioClip::is_empty) {
        return PronunciationAnalysis::no_audio();
    }
    let confidence = transcript_confidence.map(clamp_unit);
    let raw = confidence.unwrap_or(scoring.fallback_score);
    let leniency = scoring.pronunciation_leniency(level);
    let score = clamp_unit(raw + (1.0 - raw) * leniency);

    let mut guides = Vec::new();
    let mut feedback = Vec::new();
    if let Some(c) = confidence.filter(|c| *c < scoring.low_confidence_threshold) {
        let (message, severity) = if c < scoring.very_low_confidence_threshold {
            (QUITE_LOW, Severity::High)
        } else {
            (SOMEWHAT_LOW, Severity::Medium)
        };
        feedback.push(message.to_string());
        guides.push(
            DetectedIssue::new(IssueKind::PronunciationGuide, message, IssueSource::Heuristic)
                .with_severity(severity)
                .with_confidence(1.0 - c),
        );
        guides.extend(practice_words(text).into_iter().map(|(word, parts)| {
            DetectedIssue::new(
                IssueKind::PronunciationGuide,
                format!("Practise \"{}\" as {}", word, parts.join("-")),
                IssueSource::Heuristic,
            )
            .with_severity(Severity::Low)
            .with_replacement(parts.join("-"))
            .with_confidence(1.0 - c)
        }));
    }

    PronunciationAnalysis {
        score,
        transcription_confidence: confidence,
        guides,
        feedback,
    }
}

/// Longest multi-syllable content words, most syllables first
fn practice_words(text: &str) -> Vec<(String, Vec<String>)> {
    let mut words: Vec<(String, Vec<String>)> = Vec::new();
    for word in tokenize::words(text) {
        if !tokenize::is_content_word(&word) || words.iter().any(|(w, _)| *w == word) {
            continue;
        }
        let parts = syllables(&word);
        if parts.len() >= MIN_PRACTICE_SYLLABLES {
            words.push((word, parts));
        }
    }
    words.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    words.truncate(MAX_PRACTICE_WORDS);
    words
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Rough orthographic syllable split
///
/// One consonant between vowels starts the next syllable (ba-na-na);
/// a consonant cluster is split after its first letter (mag-ni-fi-cent).
pub fn syllables(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.to_lowercase().chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        current.push(chars[i]);
        if is_vowel(chars[i]) && i + 1 < chars.len() && !is_vowel(chars[i + 1]) {
            let next_vowel = (i + 1..chars.len()).find(|&j| is_vowel(chars[j]));
            if let Some(j) = next_vowel {
                let consonants = j - (i + 1);
                if consonants >= 2 {
                    current.push(chars[i + 1]);
                    i += 1;
                }
                parts.push(std::mem::take(&mut current));
            }
        }
        i += 1;
    }
    if !current.is_empty() {
        match parts.last_mut() {
            // Trailing consonants or a lone silent "e" stay with the last syllable
            Some(last) if current.chars().all(|c| !is_vowel(c)) || current == "e" => {
                last.push_str(&current)
            },
            _ => parts.push(current),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn clip(secs: u64) -> AudioClip {
        AudioClip::silence(Duration::from_secs(secs), 16000)
    }

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("banana"), vec!["ba", "na", "na"]);
        assert_eq!(syllables("magnificent"), vec!["mag", "ni", "fi", "cent"]);
        assert_eq!(syllables("cat"), vec!["cat"]);
    }

    #[test]
    fn test_no_audio_scores_zero() {
        let scoring = FluencyScoring::default();
        let analysis = analyze(&scoring, None, "Hello there", Some(0.9), ProficiencyLevel::Advanced);
        assert_eq!(analysis.score, 0.0);
        assert!(analysis.guides.is_empty());
    }

    #[test]
    fn test_low_confidence_attaches_guides() {
        let scoring = FluencyScoring::default();
        let audio = clip(3);
        let analysis = analyze(
            &scoring,
            Some(&audio),
            "The magnificent establishment",
            Some(0.4),
            ProficiencyLevel::Advanced,
        );
        assert!(analysis.feedback[0].contains("quite low"));
        assert!(analysis.feedback[0].contains("needs attention"));
        assert!(analysis
            .guides
            .iter()
            .all(|g| g.kind == IssueKind::PronunciationGuide));
        assert!(analysis.guides.len() >= 2);

        let analysis = analyze(&scoring, Some(&audio), "Hello", Some(0.6), ProficiencyLevel::Advanced);
        assert!(!analysis.feedback[0].contains("quite low"));
        assert_eq!(analysis.guides.len(), 1);

        let analysis = analyze(&scoring, Some(&audio), "Hello", Some(0.9), ProficiencyLevel::Advanced);
        assert!(analysis.guides.is_empty());
    }

    #[test]
    fn test_beginners_scored_more_generously() {
        let scoring = FluencyScoring::default();
        let audio = clip(3);
        let beginner = analyze(&scoring, Some(&audio), "Hello", Some(0.6), ProficiencyLevel::Beginner);
        let advanced = analyze(&scoring, Some(&audio), "Hello", Some(0.6), ProficiencyLevel::Advanced);
        assert!(beginner.score > advanced.score);
        assert!((advanced.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_missing_confidence_uses_fallback() {
        let scoring = FluencyScoring::default();
        let audio = clip(3);
        let analysis = analyze(&scoring, Some(&audio), "Hello", None, ProficiencyLevel::Advanced);
        assert!((analysis.score - 0.7).abs() < 1e-6);
        assert!(analysis.transcription_confidence.is_none());
    }
}
